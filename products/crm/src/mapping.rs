/// Declares the two-way translation between a storage row and its domain type.
///
/// `fields` convert with `Into` (identity for most columns, `FixedOffset` to `Utc` for
/// timestamps), `optional` map through `Option`, and `coerced` columns are nullable numbers
/// the domain always sees as a value. Both struct literals name every field, so a column
/// added on either side without a mapping entry is a compile error.
macro_rules! wire_mapping {
    (
        $row:path => $domain:ident {
            fields: [$($field:ident),* $(,)?]
            $(, optional: [$($opt:ident),* $(,)?])?
            $(, coerced: [$($num:ident),* $(,)?])?
            $(,)?
        }
    ) => {
        impl From<$row> for $domain {
            fn from(row: $row) -> Self {
                Self {
                    $($field: row.$field.into(),)*
                    $($($opt: row.$opt.map(Into::into),)*)?
                    $($($num: $crate::model::coerce_amount(row.$num),)*)?
                }
            }
        }

        impl From<$domain> for $row {
            fn from(value: $domain) -> Self {
                Self {
                    $($field: value.$field.into(),)*
                    $($($opt: value.$opt.map(Into::into),)*)?
                    $($($num: Some(value.$num),)*)?
                }
            }
        }
    };
}
