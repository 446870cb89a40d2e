use proc_macro::TokenStream;
use syn::parse::Parser;
use syn::{parse_quote, Path, Result as SynResult};

#[derive(Debug)]
pub struct AttributeData {
    pub krate: Path,
}

impl Default for AttributeData {
    fn default() -> Self {
        Self {
            krate: parse_quote!(::provido),
        }
    }
}

pub fn parse_attributes(attr: TokenStream) -> SynResult<AttributeData> {
    let mut data = AttributeData::default();
    if attr.is_empty() {
        return Ok(data);
    }

    let parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("crate") {
            data.krate = meta.value()?.parse()?;
            Ok(())
        } else {
            Err(meta.error("unsupported attribute, expects `crate = path`"))
        }
    });
    parser.parse(attr)?;

    Ok(data)
}
