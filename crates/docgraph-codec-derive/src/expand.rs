use proc_macro2::TokenStream;
use quote::{quote, quote_spanned};
use syn::spanned::Spanned;
use syn::{Data, DeriveInput, Fields, Ident, Type};

use crate::attrs::{ContainerAttrs, FieldAttrs, KindOverride, pascal_case};
use crate::types::{is_known_scalar, option_inner, vec_inner};

enum Shape {
    Scalar { optional: bool },
    Object { inner: Type, optional: bool },
    ScalarList,
    ObjectList { inner: Type },
    Ignored,
}

struct FieldModel {
    ident: Ident,
    name: String,
    header: bool,
    shape: Shape,
}

impl FieldModel {
    fn from_field(field: &syn::Field) -> syn::Result<Self> {
        let Some(ident) = field.ident.clone() else {
            return Err(syn::Error::new(field.span(), "expected a named field"));
        };
        let attrs = FieldAttrs::parse(&field.attrs)?;
        let name = attrs
            .rename
            .as_ref()
            .map(|lit| lit.value())
            .unwrap_or_else(|| pascal_case(&ident.to_string()));

        if attrs.ignore {
            if attrs.header {
                return Err(syn::Error::new(
                    ident.span(),
                    "an ignored field cannot be the header field",
                ));
            }
            return Ok(Self {
                ident,
                name,
                header: false,
                shape: Shape::Ignored,
            });
        }

        let shape = infer_shape(&field.ty, attrs.kind)?;
        if attrs.header && !matches!(shape, Shape::Scalar { .. }) {
            return Err(syn::Error::new(
                ident.span(),
                "the header field must be a scalar",
            ));
        }

        Ok(Self {
            ident,
            name,
            header: attrs.header,
            shape,
        })
    }

    fn descriptor(&self) -> TokenStream {
        let name = &self.name;
        let entry = match &self.shape {
            Shape::Scalar { optional } => {
                let base = quote!(::docgraph_codec::FieldDescriptor::scalar(#name));
                let base = if *optional { quote!(#base.optional()) } else { base };
                if self.header { quote!(#base.header()) } else { base }
            }
            Shape::Object { inner, optional } => {
                let base = quote!(::docgraph_codec::FieldDescriptor::nested(
                    #name,
                    <#inner as ::docgraph_codec::MarkdownSchema>::descriptor
                ));
                if *optional { quote!(#base.optional()) } else { base }
            }
            Shape::ScalarList => quote!(::docgraph_codec::FieldDescriptor::scalar_array(#name)),
            Shape::ObjectList { inner } => quote!(::docgraph_codec::FieldDescriptor::object_array(
                #name,
                <#inner as ::docgraph_codec::MarkdownSchema>::descriptor
            )),
            Shape::Ignored => quote!(::docgraph_codec::FieldDescriptor::ignored(#name)),
        };
        quote_spanned!(self.ident.span()=> #entry)
    }

    fn push(&self) -> TokenStream {
        let ident = &self.ident;
        let name = &self.name;
        match &self.shape {
            Shape::Scalar { optional: false } => quote!(record.push_scalar(#name, &self.#ident)?;),
            Shape::Scalar { optional: true } => {
                quote!(record.push_optional_scalar(#name, self.#ident.as_ref())?;)
            }
            Shape::Object {
                optional: false, ..
            } => quote!(record.push_object(#name, &self.#ident)?;),
            Shape::Object { optional: true, .. } => {
                quote!(record.push_optional_object(#name, self.#ident.as_ref())?;)
            }
            Shape::ScalarList => quote!(record.push_scalar_list(#name, &self.#ident)?;),
            Shape::ObjectList { .. } => quote!(record.push_object_list(#name, &self.#ident)?;),
            Shape::Ignored => quote!(),
        }
    }

    fn take(&self) -> TokenStream {
        let ident = &self.ident;
        let name = &self.name;
        let value = match &self.shape {
            Shape::Scalar { optional: false } => quote!(record.scalar(#name)?),
            Shape::Scalar { optional: true } => quote!(record.optional_scalar(#name)?),
            Shape::Object {
                optional: false, ..
            } => quote!(record.object(#name)?),
            Shape::Object { optional: true, .. } => quote!(record.optional_object(#name)?),
            Shape::ScalarList => quote!(record.scalar_list(#name)?),
            Shape::ObjectList { .. } => quote!(record.object_list(#name)?),
            Shape::Ignored => quote!(::core::default::Default::default()),
        };
        quote!(#ident: #value,)
    }
}

fn infer_shape(ty: &Type, kind: Option<KindOverride>) -> syn::Result<Shape> {
    let is_scalar = |ty: &Type| match kind {
        Some(KindOverride::Scalar) => true,
        Some(KindOverride::Object) => false,
        None => is_known_scalar(ty),
    };

    if let Some(inner) = option_inner(ty) {
        if option_inner(inner).is_some() || vec_inner(inner).is_some() {
            return Err(syn::Error::new(
                ty.span(),
                "optional collections are not supported, use an empty `Vec` instead",
            ));
        }
        return Ok(if is_scalar(inner) {
            Shape::Scalar { optional: true }
        } else {
            Shape::Object {
                inner: inner.clone(),
                optional: true,
            }
        });
    }

    if let Some(inner) = vec_inner(ty) {
        if option_inner(inner).is_some() || vec_inner(inner).is_some() {
            return Err(syn::Error::new(
                ty.span(),
                "collection elements must be plain scalars or objects",
            ));
        }
        return Ok(if is_scalar(inner) {
            Shape::ScalarList
        } else {
            Shape::ObjectList {
                inner: inner.clone(),
            }
        });
    }

    Ok(if is_scalar(ty) {
        Shape::Scalar { optional: false }
    } else {
        Shape::Object {
            inner: ty.clone(),
            optional: false,
        }
    })
}

pub fn derive(input: DeriveInput) -> syn::Result<TokenStream> {
    let ident = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new(
            input.generics.span(),
            "MarkdownSchema cannot be derived for generic types",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new(
                    ident.span(),
                    "MarkdownSchema requires a struct with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new(
                ident.span(),
                "MarkdownSchema can only be derived for structs",
            ));
        }
    };

    let container = ContainerAttrs::parse(&input.attrs)?;
    let models = fields
        .iter()
        .map(FieldModel::from_field)
        .collect::<syn::Result<Vec<_>>>()?;

    let mut headers = models.iter().filter(|model| model.header);
    if let (Some(_), Some(second)) = (headers.next(), headers.next()) {
        return Err(syn::Error::new(
            second.ident.span(),
            "only one field can be marked `#[markdown(header)]`",
        ));
    }

    let type_name = ident.to_string();
    let title = container
        .title
        .map(|title| quote!(.with_title(#title)))
        .unwrap_or_default();
    let descriptors = models.iter().map(FieldModel::descriptor);
    let pushes = models.iter().map(FieldModel::push);
    let takes = models.iter().map(FieldModel::take);

    Ok(quote! {
        #[automatically_derived]
        impl ::docgraph_codec::MarkdownSchema for #ident {
            fn descriptor() -> &'static ::docgraph_codec::SchemaDescriptor {
                static DESCRIPTOR: ::std::sync::OnceLock<::docgraph_codec::SchemaDescriptor> =
                    ::std::sync::OnceLock::new();
                DESCRIPTOR.get_or_init(|| {
                    ::docgraph_codec::SchemaDescriptor::new(
                        #type_name,
                        ::std::vec![#(#descriptors),*],
                    )
                    #title
                })
            }

            #[allow(unused_mut)]
            fn to_record(&self) -> ::docgraph_codec::Result<::docgraph_codec::Record> {
                let mut record = ::docgraph_codec::Record::new();
                #(#pushes)*
                ::core::result::Result::Ok(record)
            }

            #[allow(unused_mut)]
            fn from_record(
                mut record: ::docgraph_codec::Record,
            ) -> ::docgraph_codec::Result<Self> {
                ::core::result::Result::Ok(Self {
                    #(#takes)*
                })
            }
        }
    })
}
