use ib_regexp::{
    matcher::{input::StrSource, MatchFlags},
    MatchConfig, Regex, Syntax,
};

fn main() {
    let re = Regex::new(r"(\w+)@(\w+)\.com").unwrap();
    let hay = "mail alice@example.com or bob@test.com";
    for m in re.find_all(hay) {
        println!(
            "{} (user {}, host {})",
            m.as_str(hay),
            m.group_str(1, hay).unwrap_or_default(),
            m.group_str(2, hay).unwrap_or_default()
        );
    }

    let re = Regex::builder()
        .syntax(Syntax::GREP)
        .config(MatchConfig::builder().case_insensitive(true).build())
        .build(r"^error\|^warn")
        .unwrap();
    let log = "WARN disk\ninfo ok\nError net";
    // multiline is off, so only the first line's start is a line start
    assert_eq!(re.find_all(log).len(), 1);

    // anchored attempt in the middle of a text
    let re = Regex::new("^net").unwrap();
    let mut source = StrSource::new(log);
    assert!(re.match_at(&mut source, 24, MatchFlags::ANCHOR_INDEX).is_some());
    assert!(re.match_at(&mut source, 24, MatchFlags::empty()).is_none());

    println!("{}", re.replace_all(log, "[$0]"));
}
