use std::{
    fmt::Display,
    path::{Path, PathBuf},
    str::FromStr,
};

use crate::Error;

const WORKBOOK_EXTENSIONS: [&str; 4] = ["xlsx", "xlsm", "xls", "ods"];

/// Where to read a table from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    /// An HTTP(S) URL that serves CSV, e.g. a Google Sheets `output=csv` export link.
    Url(String),
    /// A local CSV file or workbook.
    File {
        /// The path to the file.
        path: PathBuf,
        /// The worksheet to read for workbooks, the first sheet is used if `None`.
        sheet: Option<String>,
    },
}

impl SourceLocation {
    /// Whether `path` has the extension of a spreadsheet workbook rather than CSV.
    pub(crate) fn is_workbook(path: &Path) -> bool {
        path.extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| {
                WORKBOOK_EXTENSIONS
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(extension))
            })
    }
}

impl FromStr for SourceLocation {
    type Err = Error;

    /// Parse a source location from the command line.
    ///
    /// `http://` and `https://` values are URLs. Anything else is a file path
    /// that must exist. Workbook paths may select a sheet with a `#Sheet` suffix.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        let invalid = |reason: &str| Error::InvalidSourceLocation(value.to_owned(), reason.to_owned());

        if value.is_empty() {
            return Err(invalid("the location is empty"));
        }

        if value.starts_with("http://") || value.starts_with("https://") {
            return Ok(SourceLocation::Url(value.to_owned()));
        }

        if let Some((scheme, _)) = value.split_once("://") {
            return Err(invalid(&format!(
                "unsupported scheme \"{scheme}\", use http(s) or a file path"
            )));
        }

        let (path, sheet) = match value.rsplit_once('#') {
            Some((path, sheet)) if !sheet.trim().is_empty() => {
                (PathBuf::from(path), Some(sheet.trim().to_owned()))
            }
            _ => (PathBuf::from(value), None),
        };

        if !path.is_file() {
            return Err(invalid("the file does not exist"));
        }

        if sheet.is_some() && !Self::is_workbook(&path) {
            return Err(invalid(
                "a sheet name can only be given for workbook files (.xlsx, .xlsm, .xls, .ods)",
            ));
        }

        Ok(SourceLocation::File { path, sheet })
    }
}

impl Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceLocation::Url(url) => write!(f, "{url}"),
            SourceLocation::File { path, sheet: None } => write!(f, "{}", path.display()),
            SourceLocation::File {
                path,
                sheet: Some(sheet),
            } => write!(f, "{}#{sheet}", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{io::Write, path::PathBuf};

    use crate::Error;

    use super::SourceLocation;

    #[test]
    fn parses_urls() {
        let url = "https://docs.google.com/spreadsheets/d/e/abc/pub?output=csv";

        let location: SourceLocation = url.parse().unwrap();

        assert_eq!(location, SourceLocation::Url(url.to_owned()));
    }

    #[test]
    fn rejects_unknown_schemes() {
        let result = "ftp://example.com/budget.csv".parse::<SourceLocation>();

        assert!(matches!(result, Err(Error::InvalidSourceLocation(..))));
    }

    #[test]
    fn rejects_empty_location() {
        let result = "  ".parse::<SourceLocation>();

        assert!(matches!(result, Err(Error::InvalidSourceLocation(..))));
    }

    #[test]
    fn rejects_missing_files() {
        let result = "/definitely/not/here/budget.csv".parse::<SourceLocation>();

        assert!(matches!(result, Err(Error::InvalidSourceLocation(..))));
    }

    #[test]
    fn parses_existing_csv_file() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "team,base").unwrap();
        let path = file.path().to_str().unwrap().to_owned();

        let location: SourceLocation = path.parse().unwrap();

        assert_eq!(
            location,
            SourceLocation::File {
                path: PathBuf::from(path),
                sheet: None
            }
        );
    }

    #[test]
    fn rejects_sheet_name_for_csv_file() {
        let file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        let value = format!("{}#Budget", file.path().display());

        let result = value.parse::<SourceLocation>();

        assert!(matches!(result, Err(Error::InvalidSourceLocation(..))));
    }

    #[test]
    fn parses_sheet_name_for_workbook() {
        let file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        let value = format!("{}#Budget", file.path().display());

        let location: SourceLocation = value.parse().unwrap();

        assert_eq!(
            location,
            SourceLocation::File {
                path: file.path().to_owned(),
                sheet: Some("Budget".to_owned())
            }
        );
        assert_eq!(location.to_string(), value);
    }
}
