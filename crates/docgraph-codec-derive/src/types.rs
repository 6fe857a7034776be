//! Syntactic type analysis used to infer field kinds.

use syn::{GenericArgument, PathArguments, Type};

/// Type names written as a single bullet value without any attribute.
const KNOWN_SCALARS: &[&str] = &[
    "String", "bool", "i8", "i16", "i32", "i64", "isize", "u8", "u16", "u32", "u64", "usize",
    "Uuid", "DateTime",
];

fn last_segment(ty: &Type) -> Option<&syn::PathSegment> {
    match ty {
        Type::Path(path) if path.qself.is_none() => path.path.segments.last(),
        _ => None,
    }
}

/// The `T` of `wrapper<T>`, if `ty` is spelled that way.
fn single_argument<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let segment = last_segment(ty)?;
    if segment.ident != wrapper {
        return None;
    }
    match &segment.arguments {
        PathArguments::AngleBracketed(args) if args.args.len() == 1 => match args.args.first()? {
            GenericArgument::Type(inner) => Some(inner),
            _ => None,
        },
        _ => None,
    }
}

pub fn option_inner(ty: &Type) -> Option<&Type> {
    single_argument(ty, "Option")
}

pub fn vec_inner(ty: &Type) -> Option<&Type> {
    single_argument(ty, "Vec")
}

pub fn is_known_scalar(ty: &Type) -> bool {
    last_segment(ty).is_some_and(|segment| {
        KNOWN_SCALARS
            .iter()
            .any(|known| segment.ident == known)
    })
}
