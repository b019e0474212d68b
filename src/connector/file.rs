//! Tabular files: one relation per file, named after its stem

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::instrument;

use super::error::ConnectorError;
use super::{ConnectionStatus, Connector};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Delimited(u8),
    /// Workbooks are recognised but cannot be read
    Workbook,
}

impl FileFormat {
    fn of(path: &Path) -> Result<Self, ConnectorError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "csv" => Ok(FileFormat::Delimited(b',')),
            "tsv" | "tab" => Ok(FileFormat::Delimited(b'\t')),
            "xlsx" | "xls" | "xlsm" => Ok(FileFormat::Workbook),
            other => Err(ConnectorError::UnsupportedBackend(format!("file format '{}'", other))),
        }
    }
}

/// A CSV or TSV file
#[derive(Debug, Clone)]
pub struct FileConnector {
    path: PathBuf,
}

impl FileConnector {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn relation_name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn delimiter(&self) -> Result<u8, ConnectorError> {
        match FileFormat::of(&self.path)? {
            FileFormat::Delimited(delimiter) => Ok(delimiter),
            FileFormat::Workbook => Err(ConnectorError::UnsupportedBackend("workbook files".to_string())),
        }
    }

    /// Header row, read off the async runtime
    async fn headers(&self) -> Result<Vec<String>, ConnectorError> {
        let delimiter = self.delimiter()?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || read_headers(&path, delimiter))
            .await
            .map_err(|err| ConnectorError::ConnectionFailure(err.to_string()))?
    }
}

fn read_headers(path: &Path, delimiter: u8) -> Result<Vec<String>, ConnectorError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_path(path)
        .map_err(|err| ConnectorError::ConnectionFailure(err.to_string()))?;
    let headers = reader
        .headers()
        .map_err(|err| ConnectorError::ConnectionFailure(err.to_string()))?;
    Ok(headers.iter().map(|h| h.trim().to_string()).collect())
}

#[async_trait]
impl Connector for FileConnector {
    #[instrument(skip_all, fields(path = %self.path.display()))]
    async fn test_connection(&self) -> ConnectionStatus {
        match self.headers().await {
            Ok(_) => ConnectionStatus::ok(),
            Err(err) => ConnectionStatus::failed(err.to_string()),
        }
    }

    async fn list_relations(&self) -> Result<Vec<String>, ConnectorError> {
        self.delimiter()?;
        Ok(vec![self.relation_name()])
    }

    #[instrument(skip_all, fields(path = %self.path.display(), relation = %relation), err)]
    async fn list_fields(&self, relation: &str) -> Result<Vec<String>, ConnectorError> {
        self.delimiter()?;
        if relation != self.relation_name() {
            return Err(ConnectorError::RelationNotFound(relation.to_string()));
        }
        self.headers().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[tokio::test]
    async fn test_csv_relation_and_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "orders.csv", "id,region, amount\n1,EU,10\n");
        let connector = FileConnector::new(path);

        assert!(connector.test_connection().await.ok);
        assert_eq!(connector.list_relations().await.unwrap(), vec!["orders"]);
        assert_eq!(
            connector.list_fields("orders").await.unwrap(),
            vec!["id", "region", "amount"]
        );
        assert!(matches!(
            connector.list_fields("customers").await,
            Err(ConnectorError::RelationNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_tsv_uses_tab_delimiter() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "regions.tsv", "code\tname\nEU\tEurope\n");
        let connector = FileConnector::new(path);
        assert_eq!(connector.list_fields("regions").await.unwrap(), vec!["code", "name"]);
    }

    #[tokio::test]
    async fn test_workbook_is_unsupported() {
        let connector = FileConnector::new(PathBuf::from("/data/sales.xlsx"));
        let status = connector.test_connection().await;
        assert!(!status.ok);
        assert!(status.diagnostic.unwrap().contains("workbook"));
        assert!(matches!(
            connector.list_relations().await,
            Err(ConnectorError::UnsupportedBackend(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_file_fails_test() {
        let connector = FileConnector::new(PathBuf::from("/nonexistent/orders.csv"));
        let status = connector.test_connection().await;
        assert!(!status.ok);
        assert!(status.diagnostic.is_some());
    }
}
