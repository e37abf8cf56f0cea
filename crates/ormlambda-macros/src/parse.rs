//! Attribute parsing for `#[derive(Table)]`.
//!
//! Struct-level attributes declare the table name and its relationships;
//! field-level attributes declare column flags. Everything is collected into
//! a [`TableDef`] that the validator and the code generator consume.

use proc_macro2::Span;
use syn::spanned::Spanned;
use syn::{
    Attribute, Data, DeriveInput, Error, Field, Fields, GenericArgument, Generics, Ident, Lit,
    LitStr, PathArguments, Result, Type, Visibility,
};

/// Parsed table definition from a struct.
#[derive(Debug)]
pub struct TableDef {
    /// Struct name
    pub name: Ident,
    /// Struct visibility, reused for the generated proxy
    pub vis: Visibility,
    /// Declared table name
    pub table_name: Option<LitStr>,
    /// Columns in declaration order
    pub fields: Vec<FieldDef>,
    /// Declared relationships
    pub foreign_keys: Vec<ForeignKeyDef>,
    /// Generic parameters (rejected by validation)
    pub generics: Generics,
}

impl TableDef {
    /// Fields that map to a column.
    pub fn column_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| !f.skip)
    }

    /// Name of the generated proxy type.
    pub fn proxy_name(&self) -> Ident {
        quote::format_ident!("{}Proxy", self.name)
    }
}

/// Parsed field definition.
#[derive(Debug)]
pub struct FieldDef {
    pub name: Ident,
    pub column_name: String,
    pub ty: Type,
    pub sql_type: Option<LitStr>,
    pub primary_key: bool,
    pub auto_increment: bool,
    pub auto_generated: bool,
    pub unique: bool,
    /// `Some(true)` when forced by attribute; otherwise inferred from the type
    pub not_null: Option<bool>,
    pub default: Option<String>,
    /// Not a column: left at `Default::default()` when read back
    pub skip: bool,
}

/// One `#[ormlambda(foreign_key(...))]` declaration.
#[derive(Debug)]
pub struct ForeignKeyDef {
    pub name: LitStr,
    pub table: syn::Path,
    pub left: LitStr,
    pub right: LitStr,
    pub op: Option<LitStr>,
    pub span: Span,
}

/// Parse a `DeriveInput` into a `TableDef`.
///
/// Returns an error if the input is not a struct with named fields or if an
/// attribute is unknown or malformed.
pub fn parse_table(input: &DeriveInput) -> Result<TableDef> {
    let StructAttrs {
        table_name,
        foreign_keys,
    } = parse_struct_attrs(&input.attrs)?;

    let fields = match &input.data {
        Data::Struct(data) => parse_fields(&data.fields)?,
        Data::Enum(_) => {
            return Err(Error::new_spanned(
                input,
                "Table can only be derived for structs, not enums",
            ));
        }
        Data::Union(_) => {
            return Err(Error::new_spanned(
                input,
                "Table can only be derived for structs, not unions",
            ));
        }
    };

    Ok(TableDef {
        name: input.ident.clone(),
        vis: input.vis.clone(),
        table_name,
        fields,
        foreign_keys,
        generics: input.generics.clone(),
    })
}

struct StructAttrs {
    table_name: Option<LitStr>,
    foreign_keys: Vec<ForeignKeyDef>,
}

fn parse_str_value(meta: &syn::meta::ParseNestedMeta<'_>, what: &str) -> Result<LitStr> {
    let value: Lit = meta.value()?.parse()?;
    if let Lit::Str(lit_str) = value {
        Ok(lit_str)
    } else {
        Err(Error::new_spanned(
            value,
            format!("expected string literal for {what}"),
        ))
    }
}

/// Parse struct-level `#[ormlambda(...)]` attributes.
///
/// Supported keys:
/// - `table = "name"`
/// - `foreign_key(name = "..", table = Type, left = "..", right = "..", op = "=")`
fn parse_struct_attrs(attrs: &[Attribute]) -> Result<StructAttrs> {
    let mut table_name: Option<LitStr> = None;
    let mut foreign_keys = Vec::new();

    for attr in attrs {
        if !attr.path().is_ident("ormlambda") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                if table_name.is_some() {
                    return Err(Error::new_spanned(
                        meta.path,
                        "duplicate ormlambda attribute: table",
                    ));
                }
                table_name = Some(parse_str_value(&meta, "table name")?);
                Ok(())
            } else if meta.path.is_ident("foreign_key") {
                foreign_keys.push(parse_foreign_key(&meta)?);
                Ok(())
            } else {
                Err(Error::new_spanned(
                    meta.path,
                    "unknown ormlambda struct attribute (supported: table, foreign_key)",
                ))
            }
        })?;
    }

    Ok(StructAttrs {
        table_name,
        foreign_keys,
    })
}

fn parse_foreign_key(meta: &syn::meta::ParseNestedMeta<'_>) -> Result<ForeignKeyDef> {
    let span = meta.path.span();
    let mut name = None;
    let mut table = None;
    let mut left = None;
    let mut right = None;
    let mut op = None;

    meta.parse_nested_meta(|inner| {
        if inner.path.is_ident("name") {
            name = Some(parse_str_value(&inner, "relationship name")?);
        } else if inner.path.is_ident("table") {
            table = Some(inner.value()?.parse::<syn::Path>()?);
        } else if inner.path.is_ident("left") {
            left = Some(parse_str_value(&inner, "left column")?);
        } else if inner.path.is_ident("right") {
            right = Some(parse_str_value(&inner, "right column")?);
        } else if inner.path.is_ident("op") {
            op = Some(parse_str_value(&inner, "join operator")?);
        } else {
            return Err(Error::new_spanned(
                inner.path,
                "unknown foreign_key key (supported: name, table, left, right, op)",
            ));
        }
        Ok(())
    })?;

    let missing = |key: &str| Error::new(span, format!("foreign_key requires `{key}`"));
    Ok(ForeignKeyDef {
        name: name.ok_or_else(|| missing("name"))?,
        table: table.ok_or_else(|| missing("table"))?,
        left: left.ok_or_else(|| missing("left"))?,
        right: right.ok_or_else(|| missing("right"))?,
        op,
        span,
    })
}

fn parse_fields(fields: &Fields) -> Result<Vec<FieldDef>> {
    match fields {
        Fields::Named(named) => named.named.iter().map(parse_field).collect(),
        Fields::Unnamed(_) => Err(Error::new(
            Span::call_site(),
            "Table requires a struct with named fields, not a tuple struct",
        )),
        Fields::Unit => Err(Error::new(
            Span::call_site(),
            "Table requires a struct with fields, not a unit struct",
        )),
    }
}

fn parse_field(field: &Field) -> Result<FieldDef> {
    let name = field
        .ident
        .clone()
        .ok_or_else(|| Error::new_spanned(field, "expected named field"))?;

    let mut def = FieldDef {
        column_name: syn::ext::IdentExt::unraw(&name).to_string(),
        name,
        ty: field.ty.clone(),
        sql_type: None,
        primary_key: false,
        auto_increment: false,
        auto_generated: false,
        unique: false,
        not_null: None,
        default: None,
        skip: false,
    };

    for attr in &field.attrs {
        if !attr.path().is_ident("ormlambda") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            let path = &meta.path;
            if path.is_ident("primary_key") {
                def.primary_key = true;
            } else if path.is_ident("auto_increment") {
                def.auto_increment = true;
            } else if path.is_ident("auto_generated") {
                def.auto_generated = true;
            } else if path.is_ident("unique") {
                def.unique = true;
            } else if path.is_ident("not_null") {
                def.not_null = Some(true);
            } else if path.is_ident("skip") {
                def.skip = true;
            } else if path.is_ident("column") {
                def.column_name = parse_str_value(&meta, "column name")?.value();
            } else if path.is_ident("sql_type") {
                def.sql_type = Some(parse_str_value(&meta, "sql_type")?);
            } else if path.is_ident("default") {
                def.default = Some(parse_str_value(&meta, "default")?.value());
            } else {
                return Err(Error::new_spanned(
                    path,
                    "unknown ormlambda field attribute (supported: primary_key, auto_increment, \
                     auto_generated, unique, not_null, column, sql_type, default, skip)",
                ));
            }
            Ok(())
        })?;
    }

    Ok(def)
}

/// Check if a type is `Option<T>`.
pub fn is_option_type(ty: &Type) -> bool {
    option_inner(ty).is_some()
}

/// Inner type of `Option<T>`.
pub fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first() {
        Some(GenericArgument::Type(inner)) => Some(inner),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_parse_table_and_foreign_keys() {
        let input: DeriveInput = parse_quote! {
            #[ormlambda(table = "d")]
            #[ormlambda(foreign_key(name = "c", table = C, left = "fk_d", right = "pk_c"))]
            pub struct D {
                #[ormlambda(primary_key, auto_increment)]
                pk_d: Option<i64>,
                data_d: Option<String>,
                fk_d: Option<i64>,
            }
        };
        let def = parse_table(&input).unwrap();
        assert_eq!(def.table_name.as_ref().unwrap().value(), "d");
        assert_eq!(def.fields.len(), 3);
        assert!(def.fields[0].primary_key && def.fields[0].auto_increment);
        assert_eq!(def.foreign_keys.len(), 1);
        assert_eq!(def.foreign_keys[0].name.value(), "c");
        assert_eq!(def.foreign_keys[0].left.value(), "fk_d");
        assert!(def.foreign_keys[0].op.is_none());
        assert_eq!(def.proxy_name().to_string(), "DProxy");
    }

    #[test]
    fn test_parse_field_flags() {
        let input: DeriveInput = parse_quote! {
            #[ormlambda(table = "t")]
            struct T {
                #[ormlambda(column = "created", auto_generated, default = "CURRENT_TIMESTAMP")]
                created_at: Option<String>,
                #[ormlambda(unique, not_null, sql_type = "VARCHAR(40)")]
                name: String,
                #[ormlambda(skip)]
                scratch: u8,
            }
        };
        let def = parse_table(&input).unwrap();
        let created = &def.fields[0];
        assert_eq!(created.column_name, "created");
        assert!(created.auto_generated);
        assert_eq!(created.default.as_deref(), Some("CURRENT_TIMESTAMP"));
        assert_eq!(def.fields[1].not_null, Some(true));
        assert_eq!(def.fields[1].sql_type.as_ref().unwrap().value(), "VARCHAR(40)");
        assert_eq!(def.column_fields().count(), 2);
    }

    #[test]
    fn test_unknown_attribute_is_rejected() {
        let input: DeriveInput = parse_quote! {
            #[ormlambda(table = "t", schema = "x")]
            struct T {
                id: i64,
            }
        };
        let err = parse_table(&input).unwrap_err();
        assert!(err.to_string().contains("unknown ormlambda struct attribute"));
    }

    #[test]
    fn test_foreign_key_requires_every_key() {
        let input: DeriveInput = parse_quote! {
            #[ormlambda(table = "t", foreign_key(name = "c", table = C, left = "fk"))]
            struct T {
                fk: i64,
            }
        };
        let err = parse_table(&input).unwrap_err();
        assert!(err.to_string().contains("foreign_key requires `right`"));
    }

    #[test]
    fn test_tuple_struct_is_rejected() {
        let input: DeriveInput = parse_quote! {
            #[ormlambda(table = "t")]
            struct T(i64);
        };
        assert!(parse_table(&input).is_err());
    }

    #[test]
    fn test_option_detection() {
        let ty: Type = parse_quote!(Option<i64>);
        assert!(is_option_type(&ty));
        let ty: Type = parse_quote!(std::option::Option<String>);
        assert!(is_option_type(&ty));
        let ty: Type = parse_quote!(Vec<u8>);
        assert!(!is_option_type(&ty));
    }
}
