//! Static catalog of database and storage services.
//!
//! The catalog is defined at build time and never changes at runtime.
//! Filtering is a linear scan, cheap enough to rerun on every keystroke.

use serde::Serialize;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Grouping used by the catalog filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[derive(AsRefStr, Display, EnumIter, EnumString, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ServiceCategory {
    /// Transactional relational databases.
    Relational,
    /// Cloud data warehouses.
    Warehouse,
    /// Document, key-value and wide-column stores.
    NoSql,
    /// Object and file storage.
    Storage,
    /// Query engines and OLAP stores.
    Analytics,
    /// Time-series databases.
    TimeSeries,
    /// Graph databases.
    Graph,
    /// Event streaming platforms.
    Streaming,
}

/// Immutable catalog entry describing one selectable service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseServiceDescriptor {
    /// Stable identifier, also used as the wizard's engine key.
    pub id: &'static str,
    /// Short name.
    pub name: &'static str,
    /// Name shown to users.
    pub display_name: &'static str,
    /// Connection type sent to the backend.
    pub connection_type: &'static str,
    /// Port pre-filled in the configure step.
    pub default_port: u16,
    /// Catalog group.
    pub category: ServiceCategory,
    /// Whether backend support is still in beta.
    pub beta: bool,
}

impl DatabaseServiceDescriptor {
    /// Returns true if the lowercased query occurs in the name, display
    /// name or connection type.
    fn matches_query(&self, needle: &str) -> bool {
        [self.name, self.display_name, self.connection_type]
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

const fn service(
    id: &'static str,
    name: &'static str,
    display_name: &'static str,
    connection_type: &'static str,
    default_port: u16,
    category: ServiceCategory,
) -> DatabaseServiceDescriptor {
    DatabaseServiceDescriptor {
        id,
        name,
        display_name,
        connection_type,
        default_port,
        category,
        beta: false,
    }
}

const fn beta(mut descriptor: DatabaseServiceDescriptor) -> DatabaseServiceDescriptor {
    descriptor.beta = true;
    descriptor
}

use ServiceCategory::{
    Analytics, Graph, NoSql, Relational, Storage, Streaming, TimeSeries, Warehouse,
};

static CATALOG: &[DatabaseServiceDescriptor] = &[
    service("postgresql", "PostgreSQL", "PostgreSQL", "postgresql", 5432, Relational),
    service("mysql", "MySQL", "MySQL", "mysql", 3306, Relational),
    service("mariadb", "MariaDB", "MariaDB", "mariadb", 3306, Relational),
    service("mssql", "SQL Server", "Microsoft SQL Server", "mssql", 1433, Relational),
    service("oracle", "Oracle", "Oracle Database", "oracle", 1521, Relational),
    service("db2", "Db2", "IBM Db2", "db2", 50000, Relational),
    service("sqlite", "SQLite", "SQLite", "sqlite", 0, Relational),
    service("cockroachdb", "CockroachDB", "CockroachDB", "cockroachdb", 26257, Relational),
    service("yugabytedb", "YugabyteDB", "YugabyteDB", "yugabytedb", 5433, Relational),
    service("tidb", "TiDB", "TiDB", "tidb", 4000, Relational),
    service("singlestore", "SingleStore", "SingleStore", "singlestore", 3306, Relational),
    service("sap_hana", "SAP HANA", "SAP HANA", "sap_hana", 30015, Relational),
    service("sybase", "Sybase", "SAP ASE (Sybase)", "sybase", 5000, Relational),
    service("informix", "Informix", "IBM Informix", "informix", 9088, Relational),
    service("firebird", "Firebird", "Firebird", "firebird", 3050, Relational),
    service("snowflake", "Snowflake", "Snowflake", "snowflake", 443, Warehouse),
    service("bigquery", "BigQuery", "Google BigQuery", "bigquery", 443, Warehouse),
    service("redshift", "Redshift", "Amazon Redshift", "redshift", 5439, Warehouse),
    service("databricks", "Databricks", "Databricks SQL", "databricks", 443, Warehouse),
    service("synapse", "Synapse", "Azure Synapse Analytics", "synapse", 1433, Warehouse),
    service("teradata", "Teradata", "Teradata Vantage", "teradata", 1025, Warehouse),
    service("vertica", "Vertica", "Vertica", "vertica", 5433, Warehouse),
    service("greenplum", "Greenplum", "VMware Greenplum", "greenplum", 5432, Warehouse),
    service("exasol", "Exasol", "Exasol", "exasol", 8563, Warehouse),
    beta(service("firebolt", "Firebolt", "Firebolt", "firebolt", 443, Warehouse)),
    service("mongodb", "MongoDB", "MongoDB", "mongodb", 27017, NoSql),
    service("cassandra", "Cassandra", "Apache Cassandra", "cassandra", 9042, NoSql),
    service("scylladb", "ScyllaDB", "ScyllaDB", "scylladb", 9042, NoSql),
    service("redis", "Redis", "Redis", "redis", 6379, NoSql),
    service("dynamodb", "DynamoDB", "Amazon DynamoDB", "dynamodb", 443, NoSql),
    service("couchbase", "Couchbase", "Couchbase Server", "couchbase", 8091, NoSql),
    service("couchdb", "CouchDB", "Apache CouchDB", "couchdb", 5984, NoSql),
    service("cosmosdb", "Cosmos DB", "Azure Cosmos DB", "cosmosdb", 443, NoSql),
    beta(service("firestore", "Firestore", "Google Firestore", "firestore", 443, NoSql)),
    service("s3", "S3", "Amazon S3", "s3", 443, Storage),
    service("gcs", "GCS", "Google Cloud Storage", "gcs", 443, Storage),
    service("azure_blob", "Azure Blob", "Azure Blob Storage", "azure_blob", 443, Storage),
    beta(service("minio", "MinIO", "MinIO", "minio", 9000, Storage)),
    service("clickhouse", "ClickHouse", "ClickHouse", "clickhouse", 8123, Analytics),
    service("duckdb", "DuckDB", "DuckDB", "duckdb", 0, Analytics),
    service("trino", "Trino", "Trino", "trino", 8080, Analytics),
    service("presto", "Presto", "Presto", "presto", 8080, Analytics),
    service("hive", "Hive", "Apache Hive", "hive", 10000, Analytics),
    service("druid", "Druid", "Apache Druid", "druid", 8082, Analytics),
    service("pinot", "Pinot", "Apache Pinot", "pinot", 8099, Analytics),
    service("athena", "Athena", "Amazon Athena", "athena", 443, Analytics),
    service("elasticsearch", "Elasticsearch", "Elasticsearch", "elasticsearch", 9200, Analytics),
    beta(service("opensearch", "OpenSearch", "OpenSearch", "opensearch", 9200, Analytics)),
    service("influxdb", "InfluxDB", "InfluxDB", "influxdb", 8086, TimeSeries),
    service("timescaledb", "TimescaleDB", "TimescaleDB", "timescaledb", 5432, TimeSeries),
    beta(service("questdb", "QuestDB", "QuestDB", "questdb", 8812, TimeSeries)),
    service("neo4j", "Neo4j", "Neo4j", "neo4j", 7687, Graph),
    beta(service("kafka", "Kafka", "Apache Kafka", "kafka", 9092, Streaming)),
];

/// Returns every descriptor in catalog order.
pub fn catalog() -> &'static [DatabaseServiceDescriptor] {
    CATALOG
}

/// Looks up a descriptor by id, ignoring ASCII case.
pub fn find(id: &str) -> Option<&'static DatabaseServiceDescriptor> {
    CATALOG.iter().find(|d| d.id.eq_ignore_ascii_case(id.trim()))
}

/// Filters the catalog by a free-text query and an optional category.
///
/// A blank query matches every descriptor. Results keep catalog order.
pub fn filter(
    query: &str,
    category: Option<ServiceCategory>,
) -> Vec<&'static DatabaseServiceDescriptor> {
    let needle = query.trim().to_lowercase();

    CATALOG
        .iter()
        .filter(|d| category.is_none_or(|c| d.category == c))
        .filter(|d| needle.is_empty() || d.matches_query(&needle))
        .collect()
}

/// Lists the categories that have at least one descriptor.
pub fn categories() -> Vec<ServiceCategory> {
    ServiceCategory::iter()
        .filter(|c| CATALOG.iter().any(|d| d.category == *c))
        .collect()
}
