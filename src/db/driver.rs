//! Driver names understood by the sqlx connector.

/// Supported database backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatabaseType {
    PostgreSQL,
    /// Includes MariaDB
    MySQL,
    SQLite,
}

impl DatabaseType {
    /// Map a driver name to a backend (case-insensitive).
    pub fn from_driver_name(driver: &str) -> Option<Self> {
        match driver.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" | "pgx" => Some(Self::PostgreSQL),
            "mysql" | "mariadb" => Some(Self::MySQL),
            "sqlite" | "sqlite3" => Some(Self::SQLite),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::PostgreSQL => "PostgreSQL",
            Self::MySQL => "MySQL",
            Self::SQLite => "SQLite",
        }
    }

    pub fn is_sqlite(&self) -> bool {
        matches!(self, Self::SQLite)
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_aliases() {
        for name in ["postgres", "postgresql", "pg", "pgx", "PG"] {
            assert_eq!(
                DatabaseType::from_driver_name(name),
                Some(DatabaseType::PostgreSQL),
                "{name}"
            );
        }
        assert_eq!(
            DatabaseType::from_driver_name("mariadb"),
            Some(DatabaseType::MySQL)
        );
        assert_eq!(
            DatabaseType::from_driver_name("sqlite3"),
            Some(DatabaseType::SQLite)
        );
    }

    #[test]
    fn test_unknown_driver() {
        assert_eq!(DatabaseType::from_driver_name(""), None);
        assert_eq!(DatabaseType::from_driver_name("oracle"), None);
    }
}
