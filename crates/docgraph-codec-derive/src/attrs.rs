//! `#[markdown(...)]` attribute parsing.

use syn::{Attribute, LitStr};

#[derive(Debug, Default)]
pub struct ContainerAttrs {
    pub title: Option<LitStr>,
}

impl ContainerAttrs {
    pub fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut out = Self::default();
        for attr in attrs.iter().filter(|attr| attr.path().is_ident("markdown")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("title") {
                    if out.title.is_some() {
                        return Err(meta.error("duplicate `title`"));
                    }
                    out.title = Some(meta.value()?.parse()?);
                    Ok(())
                } else {
                    Err(meta.error("unknown type attribute, expected `title = \"...\"`"))
                }
            })?;
        }
        Ok(out)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindOverride {
    Scalar,
    Object,
}

#[derive(Debug, Default)]
pub struct FieldAttrs {
    pub header: bool,
    pub ignore: bool,
    pub rename: Option<LitStr>,
    pub kind: Option<KindOverride>,
}

impl FieldAttrs {
    pub fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut out = Self::default();
        for attr in attrs.iter().filter(|attr| attr.path().is_ident("markdown")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("header") {
                    out.header = true;
                } else if meta.path.is_ident("ignore") {
                    out.ignore = true;
                } else if meta.path.is_ident("rename") {
                    out.rename = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("scalar") {
                    out.set_kind(KindOverride::Scalar, &meta)?;
                } else if meta.path.is_ident("object") {
                    out.set_kind(KindOverride::Object, &meta)?;
                } else {
                    return Err(meta.error(
                        "unknown field attribute, expected one of `header`, `ignore`, `rename`, `scalar`, `object`",
                    ));
                }
                Ok(())
            })?;
        }
        Ok(out)
    }

    fn set_kind(
        &mut self,
        kind: KindOverride,
        meta: &syn::meta::ParseNestedMeta,
    ) -> syn::Result<()> {
        if self.kind.is_some_and(|existing| existing != kind) {
            return Err(meta.error("`scalar` and `object` are mutually exclusive"));
        }
        self.kind = Some(kind);
        Ok(())
    }
}

/// `is_some_flag` -> `IsSomeFlag`.
pub fn pascal_case(ident: &str) -> String {
    let ident = ident.strip_prefix("r#").unwrap_or(ident);
    ident
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}
