//! Mapping spreadsheet headers to the logical columns of the ledger.

use std::collections::HashMap;

use crate::config::ColumnPin;

/// A logical column that is read from one spreadsheet column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnField {
    /// The team identifier, in both tables.
    Team,
    /// The recurring monthly allocation.
    Base,
    /// The date of an expense.
    Date,
    /// The amount of an expense.
    Amount,
    /// The top-level classification of an expense.
    Category,
    /// The second-level classification of an expense.
    Subcategory,
    /// A free-text note about an expense.
    Description,
}

impl ColumnField {
    /// Every field, in the order they are listed to users.
    pub const ALL: [ColumnField; 7] = [
        ColumnField::Team,
        ColumnField::Base,
        ColumnField::Date,
        ColumnField::Amount,
        ColumnField::Category,
        ColumnField::Subcategory,
        ColumnField::Description,
    ];

    /// The name used for the field on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            ColumnField::Team => "team",
            ColumnField::Base => "base",
            ColumnField::Date => "date",
            ColumnField::Amount => "amount",
            ColumnField::Category => "category",
            ColumnField::Subcategory => "subcategory",
            ColumnField::Description => "description",
        }
    }

    /// Look up a field by its command line name, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|field| field.name().eq_ignore_ascii_case(name))
    }

    fn default_aliases(&self) -> &'static [&'static str] {
        match self {
            ColumnField::Team => &["team", "team_id", "팀", "부서", "department", "dept"],
            ColumnField::Base => &[
                "base_monthly_amount",
                "base",
                "monthly budget",
                "기본예산",
                "월예산",
                "기본",
                "budget",
                "예산",
            ],
            ColumnField::Date => &["date", "날짜", "일자", "사용일"],
            ColumnField::Amount => &["amount", "금액", "사용금액", "지출액", "spent", "cost"],
            ColumnField::Category => &["category", "분류", "대분류", "항목", "계정"],
            ColumnField::Subcategory => &["subcategory", "sub_category", "세부항목", "소분류", "세부"],
            ColumnField::Description => &["description", "memo", "내용", "적요", "비고", "note"],
        }
    }
}

const SUPPLEMENTAL_KEYWORDS: [&str; 6] = ["supplemental", "supp", "top-up", "topup", "추가", "증액"];

/// How headers are matched to logical columns.
///
/// Each field has an ordered list of header aliases. A header matches an
/// alias exactly or by containing it; English aliases must appear as whole
/// words. Headers that still match the wrong field, such as "Cost centre"
/// for the amount, can be avoided by pinning the field to an exact header
/// with a [ColumnPin].
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaConfig {
    aliases: HashMap<ColumnField, Vec<String>>,
    pins: HashMap<ColumnField, String>,
    supplemental_keywords: Vec<String>,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        let aliases = ColumnField::ALL
            .into_iter()
            .map(|field| {
                let aliases = field
                    .default_aliases()
                    .iter()
                    .map(|alias| normalize(alias))
                    .collect();

                (field, aliases)
            })
            .collect();

        Self {
            aliases,
            pins: HashMap::new(),
            supplemental_keywords: SUPPLEMENTAL_KEYWORDS
                .iter()
                .map(|keyword| normalize(keyword))
                .collect(),
        }
    }
}

/// Where each logical column was found in a table.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct ResolvedColumns {
    columns: HashMap<ColumnField, usize>,
}

impl ResolvedColumns {
    pub(crate) fn get(&self, field: ColumnField) -> Option<usize> {
        self.columns.get(&field).copied()
    }
}

impl SchemaConfig {
    /// The default aliases with some fields pinned to exact headers.
    pub fn with_pins(pins: impl IntoIterator<Item = ColumnPin>) -> Self {
        let mut schema = Self::default();

        for pin in pins {
            schema.pins.insert(pin.field, pin.header);
        }

        schema
    }

    /// The pinned header for `field`, if any.
    pub(crate) fn pinned_header(&self, field: ColumnField) -> Option<&str> {
        self.pins.get(&field).map(String::as_str)
    }

    /// Find the columns for `fields` in `headers`.
    ///
    /// Fields are resolved in the given order and each column can only be
    /// claimed once, so more specific fields should come first. A pinned
    /// field only matches its pinned header. Other fields try an exact alias
    /// match and then a header containing an alias. Columns in `claimed` are
    /// skipped.
    pub(crate) fn resolve(
        &self,
        headers: &[String],
        fields: &[ColumnField],
        claimed: &[usize],
    ) -> ResolvedColumns {
        let normalized = headers.iter().map(|header| normalize(header)).collect::<Vec<_>>();
        let mut claimed = claimed.to_vec();
        let mut columns = HashMap::new();

        for &field in fields {
            let is_free = |index: &usize| !claimed.contains(index);

            let found = match self.pins.get(&field) {
                Some(pinned) => {
                    let pinned = normalize(pinned);
                    (0..normalized.len()).filter(is_free).find(|&i| normalized[i] == pinned)
                }
                None => {
                    let aliases = self.aliases.get(&field).map(Vec::as_slice).unwrap_or_default();

                    aliases
                        .iter()
                        .find_map(|alias| {
                            (0..normalized.len())
                                .filter(is_free)
                                .find(|&i| normalized[i] == *alias)
                        })
                        .or_else(|| {
                            aliases.iter().find_map(|alias| {
                                (0..normalized.len())
                                    .filter(is_free)
                                    .find(|&i| contains_alias(&normalized[i], alias))
                            })
                        })
                }
            };

            if let Some(index) = found {
                claimed.push(index);
                columns.insert(field, index);
            }
        }

        ResolvedColumns { columns }
    }

    /// Find the supplemental allocation columns and the month each one is for.
    ///
    /// A supplemental column has a header that contains a supplemental keyword
    /// and a number from 1 to 12, e.g. "Supplemental 3" or "3월 추가예산".
    pub(crate) fn supplemental_columns(&self, headers: &[String]) -> Vec<(usize, u8)> {
        headers
            .iter()
            .enumerate()
            .filter_map(|(index, header)| {
                let header = normalize(header);
                let is_supplemental = self
                    .supplemental_keywords
                    .iter()
                    .any(|keyword| header.contains(keyword.as_str()));

                if !is_supplemental {
                    return None;
                }

                month_in_header(&header).map(|month| (index, month))
            })
            .collect()
    }
}

/// Whether `header` contains `alias`.
///
/// ASCII aliases only match whole words, so "date" does not match "updated".
/// Korean headers have no word breaks between compounds, e.g. "사용금액", so
/// other aliases match anywhere.
fn contains_alias(header: &str, alias: &str) -> bool {
    if !alias.is_ascii() {
        return header.contains(alias);
    }

    let is_word_char = |c: char| c.is_ascii_alphanumeric();

    header.match_indices(alias).any(|(start, _)| {
        let before = header[..start].chars().next_back();
        let after = header[start + alias.len()..].chars().next();

        !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
    })
}

fn normalize(header: &str) -> String {
    header.trim().to_lowercase()
}

/// The first run of digits in `header` that is a month number.
fn month_in_header(header: &str) -> Option<u8> {
    header
        .split(|c: char| !c.is_ascii_digit())
        .filter(|digits| !digits.is_empty())
        .filter_map(|digits| digits.parse::<u8>().ok())
        .find(|month| (1..=12).contains(month))
}
