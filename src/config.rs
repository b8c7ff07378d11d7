//! Start-up configuration that is parsed from the command line.

use std::str::FromStr;

use crate::{Error, ledger::ColumnField, source::SourceLocation};

/// Where the two logical tables are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    /// The table with one row per team and its monthly allocations.
    pub allocations: SourceLocation,
    /// The table with one row per expense.
    pub expenses: SourceLocation,
}

/// An exact header that a logical column must be read from, e.g. `team=부서`.
///
/// Pinned headers take precedence over the built-in header aliases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnPin {
    pub(crate) field: ColumnField,
    pub(crate) header: String,
}

impl FromStr for ColumnPin {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| Error::InvalidColumnMapping(value.to_owned(), reason);

        let (field, header) = value
            .split_once('=')
            .ok_or_else(|| invalid("expected the form FIELD=HEADER".to_owned()))?;

        let field = ColumnField::from_name(field.trim()).ok_or_else(|| {
            let known = ColumnField::ALL
                .iter()
                .map(ColumnField::name)
                .collect::<Vec<_>>()
                .join(", ");

            invalid(format!("unknown field \"{}\", expected one of {known}", field.trim()))
        })?;

        let header = header.trim();
        if header.is_empty() {
            return Err(invalid("the header is empty".to_owned()));
        }

        Ok(Self {
            field,
            header: header.to_owned(),
        })
    }
}
