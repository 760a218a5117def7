//! Unicode utils.
/*!
## Features
- [Simple case mapping](case) of single characters, the only case folding `ib-regexp` does
- Fast [ASCII](ascii) detection, used to index ASCII haystacks without decoding them

## Crate features
*/
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![cfg_attr(feature = "doc", doc = document_features::document_features!())]
pub mod ascii;
pub mod case;

mod private {
    pub trait Sealed {}
}
use private::Sealed;

impl Sealed for char {}
impl Sealed for str {}
