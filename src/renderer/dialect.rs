//! Per-backend SQL conventions, kept in one table

use std::fmt;

use super::error::RenderError;

/// SQL dialect of a relational data source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    MySql,
    Postgres,
    Sqlite,
    Oracle,
    SqlServer,
}

/// How bound parameters are spelled in query text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// `?`
    Question,
    /// `$1`, `$2`, ...
    Dollar,
    /// `:1`, `:2`, ...
    Colon,
    /// `@p1`, `@p2`, ...
    AtP,
}

/// How a result page is requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pagination {
    /// `LIMIT n OFFSET m`
    LimitOffset,
    /// `OFFSET m ROWS FETCH NEXT n ROWS ONLY`; `requires_order` means an
    /// ORDER BY must precede it
    OffsetFetch { requires_order: bool },
}

#[derive(Debug)]
pub struct DialectSpec {
    pub name: &'static str,
    pub quote_open: char,
    pub quote_close: char,
    pub placeholder: Placeholder,
    pub pagination: Pagination,
}

const MYSQL: DialectSpec = DialectSpec {
    name: "mysql",
    quote_open: '`',
    quote_close: '`',
    placeholder: Placeholder::Question,
    pagination: Pagination::LimitOffset,
};

const POSTGRES: DialectSpec = DialectSpec {
    name: "postgres",
    quote_open: '"',
    quote_close: '"',
    placeholder: Placeholder::Dollar,
    pagination: Pagination::LimitOffset,
};

const SQLITE: DialectSpec = DialectSpec {
    name: "sqlite",
    quote_open: '"',
    quote_close: '"',
    placeholder: Placeholder::Question,
    pagination: Pagination::LimitOffset,
};

const ORACLE: DialectSpec = DialectSpec {
    name: "oracle",
    quote_open: '"',
    quote_close: '"',
    placeholder: Placeholder::Colon,
    pagination: Pagination::OffsetFetch { requires_order: false },
};

const SQL_SERVER: DialectSpec = DialectSpec {
    name: "sqlserver",
    quote_open: '[',
    quote_close: ']',
    placeholder: Placeholder::AtP,
    pagination: Pagination::OffsetFetch { requires_order: true },
};

impl Dialect {
    /// Map a data source `db_type` string
    pub fn from_db_type(db_type: &str) -> Result<Self, RenderError> {
        match db_type.trim().to_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "postgresql" | "postgres" | "pg" => Ok(Dialect::Postgres),
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            "oracle" => Ok(Dialect::Oracle),
            "sqlserver" | "mssql" | "sql_server" => Ok(Dialect::SqlServer),
            other => Err(RenderError::UnsupportedBackend(other.to_string())),
        }
    }

    pub fn spec(&self) -> &'static DialectSpec {
        match self {
            Dialect::MySql => &MYSQL,
            Dialect::Postgres => &POSTGRES,
            Dialect::Sqlite => &SQLITE,
            Dialect::Oracle => &ORACLE,
            Dialect::SqlServer => &SQL_SERVER,
        }
    }

    /// Quote one identifier, doubling any embedded closing quote
    pub fn quote_ident(&self, ident: &str) -> String {
        let spec = self.spec();
        let close = spec.quote_close.to_string();
        let escaped = ident.replace(&close, &close.repeat(2));
        format!("{}{}{}", spec.quote_open, escaped, spec.quote_close)
    }

    /// Quote a possibly schema-qualified table name part by part
    pub fn quote_table(&self, name: &str) -> String {
        name.split('.')
            .map(|part| self.quote_ident(part))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Placeholder for the parameter at 1-based `position`
    pub fn placeholder(&self, position: usize) -> String {
        match self.spec().placeholder {
            Placeholder::Question => "?".to_string(),
            Placeholder::Dollar => format!("${}", position),
            Placeholder::Colon => format!(":{}", position),
            Placeholder::AtP => format!("@p{}", position),
        }
    }

    pub fn name(&self) -> &'static str {
        self.spec().name
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_db_type() {
        assert_eq!(Dialect::from_db_type("MySQL").unwrap(), Dialect::MySql);
        assert_eq!(Dialect::from_db_type("postgresql").unwrap(), Dialect::Postgres);
        assert_eq!(Dialect::from_db_type("oracle").unwrap(), Dialect::Oracle);
        assert_eq!(Dialect::from_db_type("mssql").unwrap(), Dialect::SqlServer);
        let err = Dialect::from_db_type("db2").unwrap_err();
        assert!(matches!(err, RenderError::UnsupportedBackend(ref t) if t == "db2"));
    }

    #[test]
    fn test_quote_ident_per_dialect() {
        assert_eq!(Dialect::MySql.quote_ident("region"), "`region`");
        assert_eq!(Dialect::Postgres.quote_ident("region"), "\"region\"");
        assert_eq!(Dialect::Sqlite.quote_ident("region"), "\"region\"");
        assert_eq!(Dialect::Oracle.quote_ident("region"), "\"region\"");
        assert_eq!(Dialect::SqlServer.quote_ident("region"), "[region]");
    }

    #[test]
    fn test_quote_ident_escapes_closing_quote() {
        assert_eq!(Dialect::MySql.quote_ident("we`ird"), "`we``ird`");
        assert_eq!(Dialect::Postgres.quote_ident("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(Dialect::SqlServer.quote_ident("we]ird"), "[we]]ird]");
    }

    #[test]
    fn test_quote_table_splits_schema() {
        assert_eq!(Dialect::Postgres.quote_table("sales.orders"), "\"sales\".\"orders\"");
        assert_eq!(Dialect::SqlServer.quote_table("dbo.orders"), "[dbo].[orders]");
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(Dialect::MySql.placeholder(2), "?");
        assert_eq!(Dialect::Postgres.placeholder(2), "$2");
        assert_eq!(Dialect::Oracle.placeholder(2), ":2");
        assert_eq!(Dialect::SqlServer.placeholder(2), "@p2");
    }
}
