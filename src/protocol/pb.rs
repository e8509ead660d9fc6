//! Protobuf wire messages of the 2015-12-31 protocol.
//!
//! The service speaks proto2; messages are written out here by hand with
//! prost derives instead of being generated from a descriptor. Row
//! payloads inside these messages are opaque PlainBuffer blobs.

/// The error body of any non-2xx response.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Error {
    #[prost(string, required, tag = "1")]
    pub code: ::prost::alloc::string::String,
    #[prost(string, optional, tag = "2")]
    pub message: ::core::option::Option<::prost::alloc::string::String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum PrimaryKeyType {
    Integer = 1,
    String = 2,
    Binary = 3,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum PrimaryKeyOption {
    AutoIncrement = 1,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PrimaryKeySchema {
    #[prost(string, required, tag = "1")]
    pub name: ::prost::alloc::string::String,
    #[prost(enumeration = "PrimaryKeyType", required, tag = "2")]
    pub r#type: i32,
    #[prost(enumeration = "PrimaryKeyOption", optional, tag = "3")]
    pub option: ::core::option::Option<i32>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TableMeta {
    #[prost(string, required, tag = "1")]
    pub table_name: ::prost::alloc::string::String,
    #[prost(message, repeated, tag = "2")]
    pub primary_key: ::prost::alloc::vec::Vec<PrimaryKeySchema>,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct CapacityUnit {
    #[prost(int32, optional, tag = "1")]
    pub read: ::core::option::Option<i32>,
    #[prost(int32, optional, tag = "2")]
    pub write: ::core::option::Option<i32>,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct ReservedThroughput {
    #[prost(message, required, tag = "1")]
    pub capacity_unit: CapacityUnit,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct ReservedThroughputDetails {
    #[prost(message, required, tag = "1")]
    pub capacity_unit: CapacityUnit,
    #[prost(int64, optional, tag = "2")]
    pub last_increase_time: ::core::option::Option<i64>,
    #[prost(int64, optional, tag = "3")]
    pub last_decrease_time: ::core::option::Option<i64>,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct ConsumedCapacity {
    #[prost(message, required, tag = "1")]
    pub capacity_unit: CapacityUnit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum BloomFilterType {
    None = 1,
    Cell = 2,
    Row = 3,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct TableOptions {
    #[prost(int32, optional, tag = "1")]
    pub time_to_live: ::core::option::Option<i32>,
    #[prost(int32, optional, tag = "2")]
    pub max_versions: ::core::option::Option<i32>,
    #[prost(enumeration = "BloomFilterType", optional, tag = "3")]
    pub bloom_filter_type: ::core::option::Option<i32>,
    #[prost(int32, optional, tag = "4")]
    pub block_size: ::core::option::Option<i32>,
    #[prost(int64, optional, tag = "5")]
    pub deviation_cell_version_in_sec: ::core::option::Option<i64>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateTableRequest {
    #[prost(message, required, tag = "1")]
    pub table_meta: TableMeta,
    #[prost(message, required, tag = "2")]
    pub reserved_throughput: ReservedThroughput,
    #[prost(message, optional, tag = "3")]
    pub table_options: ::core::option::Option<TableOptions>,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct CreateTableResponse {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateTableRequest {
    #[prost(string, required, tag = "1")]
    pub table_name: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "2")]
    pub reserved_throughput: ::core::option::Option<ReservedThroughput>,
    #[prost(message, optional, tag = "3")]
    pub table_options: ::core::option::Option<TableOptions>,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct UpdateTableResponse {
    #[prost(message, required, tag = "1")]
    pub reserved_throughput_details: ReservedThroughputDetails,
    #[prost(message, optional, tag = "2")]
    pub table_options: ::core::option::Option<TableOptions>,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct ListTableRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListTableResponse {
    #[prost(string, repeated, tag = "1")]
    pub table_names: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeleteTableRequest {
    #[prost(string, required, tag = "1")]
    pub table_name: ::prost::alloc::string::String,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct DeleteTableResponse {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DescribeTableRequest {
    #[prost(string, required, tag = "1")]
    pub table_name: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DescribeTableResponse {
    #[prost(message, required, tag = "1")]
    pub table_meta: TableMeta,
    #[prost(message, required, tag = "2")]
    pub reserved_throughput_details: ReservedThroughputDetails,
    #[prost(message, optional, tag = "3")]
    pub table_options: ::core::option::Option<TableOptions>,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct TimeRange {
    #[prost(int64, optional, tag = "1")]
    pub start_time: ::core::option::Option<i64>,
    #[prost(int64, optional, tag = "2")]
    pub end_time: ::core::option::Option<i64>,
    #[prost(int64, optional, tag = "3")]
    pub specific_time: ::core::option::Option<i64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum RowExistenceExpectation {
    Ignore = 0,
    ExpectExist = 1,
    ExpectNotExist = 2,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Condition {
    #[prost(enumeration = "RowExistenceExpectation", required, tag = "1")]
    pub row_existence: i32,
    /// A serialized `Filter`.
    #[prost(bytes = "vec", optional, tag = "2")]
    pub column_condition: ::core::option::Option<::prost::alloc::vec::Vec<u8>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ReturnType {
    RtNone = 0,
    RtPk = 1,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct ReturnContent {
    #[prost(enumeration = "ReturnType", optional, tag = "1")]
    pub return_type: ::core::option::Option<i32>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetRowRequest {
    #[prost(string, required, tag = "1")]
    pub table_name: ::prost::alloc::string::String,
    /// A PlainBuffer-encoded primary key.
    #[prost(bytes = "vec", required, tag = "2")]
    pub primary_key: ::prost::alloc::vec::Vec<u8>,
    #[prost(string, repeated, tag = "3")]
    pub columns_to_get: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    #[prost(message, optional, tag = "4")]
    pub time_range: ::core::option::Option<TimeRange>,
    #[prost(int32, optional, tag = "5")]
    pub max_versions: ::core::option::Option<i32>,
    /// A serialized `Filter`.
    #[prost(bytes = "vec", optional, tag = "7")]
    pub filter: ::core::option::Option<::prost::alloc::vec::Vec<u8>>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetRowResponse {
    #[prost(message, required, tag = "1")]
    pub consumed: ConsumedCapacity,
    /// A PlainBuffer-encoded row; empty when the row does not exist.
    #[prost(bytes = "vec", required, tag = "2")]
    pub row: ::prost::alloc::vec::Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PutRowRequest {
    #[prost(string, required, tag = "1")]
    pub table_name: ::prost::alloc::string::String,
    /// A PlainBuffer-encoded row.
    #[prost(bytes = "vec", required, tag = "2")]
    pub row: ::prost::alloc::vec::Vec<u8>,
    #[prost(message, required, tag = "3")]
    pub condition: Condition,
    #[prost(message, optional, tag = "4")]
    pub return_content: ::core::option::Option<ReturnContent>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PutRowResponse {
    #[prost(message, required, tag = "1")]
    pub consumed: ConsumedCapacity,
    #[prost(bytes = "vec", optional, tag = "2")]
    pub row: ::core::option::Option<::prost::alloc::vec::Vec<u8>>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateRowRequest {
    #[prost(string, required, tag = "1")]
    pub table_name: ::prost::alloc::string::String,
    /// A PlainBuffer-encoded row update.
    #[prost(bytes = "vec", required, tag = "2")]
    pub row_change: ::prost::alloc::vec::Vec<u8>,
    #[prost(message, required, tag = "3")]
    pub condition: Condition,
    #[prost(message, optional, tag = "4")]
    pub return_content: ::core::option::Option<ReturnContent>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateRowResponse {
    #[prost(message, required, tag = "1")]
    pub consumed: ConsumedCapacity,
    #[prost(bytes = "vec", optional, tag = "2")]
    pub row: ::core::option::Option<::prost::alloc::vec::Vec<u8>>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeleteRowRequest {
    #[prost(string, required, tag = "1")]
    pub table_name: ::prost::alloc::string::String,
    /// A PlainBuffer-encoded row bearing a delete marker.
    #[prost(bytes = "vec", required, tag = "2")]
    pub primary_key: ::prost::alloc::vec::Vec<u8>,
    #[prost(message, required, tag = "3")]
    pub condition: Condition,
    #[prost(message, optional, tag = "4")]
    pub return_content: ::core::option::Option<ReturnContent>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeleteRowResponse {
    #[prost(message, required, tag = "1")]
    pub consumed: ConsumedCapacity,
    #[prost(bytes = "vec", optional, tag = "2")]
    pub row: ::core::option::Option<::prost::alloc::vec::Vec<u8>>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TableInBatchGetRowRequest {
    #[prost(string, required, tag = "1")]
    pub table_name: ::prost::alloc::string::String,
    #[prost(bytes = "vec", repeated, tag = "2")]
    pub primary_key: ::prost::alloc::vec::Vec<::prost::alloc::vec::Vec<u8>>,
    #[prost(string, repeated, tag = "3")]
    pub columns_to_get: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    #[prost(message, optional, tag = "4")]
    pub time_range: ::core::option::Option<TimeRange>,
    #[prost(int32, optional, tag = "5")]
    pub max_versions: ::core::option::Option<i32>,
    #[prost(bytes = "vec", optional, tag = "7")]
    pub filter: ::core::option::Option<::prost::alloc::vec::Vec<u8>>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BatchGetRowRequest {
    #[prost(message, repeated, tag = "1")]
    pub tables: ::prost::alloc::vec::Vec<TableInBatchGetRowRequest>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RowInBatchGetRowResponse {
    #[prost(bool, required, tag = "1")]
    pub is_ok: bool,
    #[prost(message, optional, tag = "2")]
    pub error: ::core::option::Option<Error>,
    #[prost(message, optional, tag = "3")]
    pub consumed: ::core::option::Option<ConsumedCapacity>,
    #[prost(bytes = "vec", optional, tag = "4")]
    pub row: ::core::option::Option<::prost::alloc::vec::Vec<u8>>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TableInBatchGetRowResponse {
    #[prost(string, required, tag = "1")]
    pub table_name: ::prost::alloc::string::String,
    #[prost(message, repeated, tag = "2")]
    pub rows: ::prost::alloc::vec::Vec<RowInBatchGetRowResponse>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BatchGetRowResponse {
    #[prost(message, repeated, tag = "1")]
    pub tables: ::prost::alloc::vec::Vec<TableInBatchGetRowResponse>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum OperationType {
    Put = 1,
    Update = 2,
    Delete = 3,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RowInBatchWriteRowRequest {
    #[prost(enumeration = "OperationType", required, tag = "1")]
    pub r#type: i32,
    /// A PlainBuffer-encoded row, update or deletion, depending on `type`.
    #[prost(bytes = "vec", required, tag = "2")]
    pub row_change: ::prost::alloc::vec::Vec<u8>,
    #[prost(message, required, tag = "3")]
    pub condition: Condition,
    #[prost(message, optional, tag = "4")]
    pub return_content: ::core::option::Option<ReturnContent>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TableInBatchWriteRowRequest {
    #[prost(string, required, tag = "1")]
    pub table_name: ::prost::alloc::string::String,
    #[prost(message, repeated, tag = "2")]
    pub rows: ::prost::alloc::vec::Vec<RowInBatchWriteRowRequest>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BatchWriteRowRequest {
    #[prost(message, repeated, tag = "1")]
    pub tables: ::prost::alloc::vec::Vec<TableInBatchWriteRowRequest>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RowInBatchWriteRowResponse {
    #[prost(bool, required, tag = "1")]
    pub is_ok: bool,
    #[prost(message, optional, tag = "2")]
    pub error: ::core::option::Option<Error>,
    #[prost(message, optional, tag = "3")]
    pub consumed: ::core::option::Option<ConsumedCapacity>,
    #[prost(bytes = "vec", optional, tag = "4")]
    pub row: ::core::option::Option<::prost::alloc::vec::Vec<u8>>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TableInBatchWriteRowResponse {
    #[prost(string, required, tag = "1")]
    pub table_name: ::prost::alloc::string::String,
    #[prost(message, repeated, tag = "2")]
    pub rows: ::prost::alloc::vec::Vec<RowInBatchWriteRowResponse>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BatchWriteRowResponse {
    #[prost(message, repeated, tag = "1")]
    pub tables: ::prost::alloc::vec::Vec<TableInBatchWriteRowResponse>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum Direction {
    Forward = 0,
    Backward = 1,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetRangeRequest {
    #[prost(string, required, tag = "1")]
    pub table_name: ::prost::alloc::string::String,
    #[prost(enumeration = "Direction", required, tag = "2")]
    pub direction: i32,
    #[prost(string, repeated, tag = "3")]
    pub columns_to_get: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    #[prost(message, optional, tag = "4")]
    pub time_range: ::core::option::Option<TimeRange>,
    #[prost(int32, optional, tag = "5")]
    pub max_versions: ::core::option::Option<i32>,
    #[prost(int32, optional, tag = "6")]
    pub limit: ::core::option::Option<i32>,
    #[prost(bytes = "vec", required, tag = "7")]
    pub inclusive_start_primary_key: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", required, tag = "8")]
    pub exclusive_end_primary_key: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", optional, tag = "10")]
    pub filter: ::core::option::Option<::prost::alloc::vec::Vec<u8>>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetRangeResponse {
    #[prost(message, required, tag = "1")]
    pub consumed: ConsumedCapacity,
    /// Concatenated PlainBuffer rows; empty when the range holds none.
    #[prost(bytes = "vec", required, tag = "2")]
    pub rows: ::prost::alloc::vec::Vec<u8>,
    /// Set when the scan stopped early; resume from this key.
    #[prost(bytes = "vec", optional, tag = "3")]
    pub next_start_primary_key: ::core::option::Option<::prost::alloc::vec::Vec<u8>>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ComputeSplitPointsBySizeRequest {
    #[prost(string, required, tag = "1")]
    pub table_name: ::prost::alloc::string::String,
    /// Desired split size in hundreds of megabytes.
    #[prost(int64, required, tag = "2")]
    pub split_size: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SplitLocation {
    #[prost(string, required, tag = "1")]
    pub location: ::prost::alloc::string::String,
    #[prost(sint64, required, tag = "2")]
    pub repeat: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ComputeSplitPointsBySizeResponse {
    #[prost(message, required, tag = "1")]
    pub consumed: ConsumedCapacity,
    #[prost(message, repeated, tag = "2")]
    pub schema: ::prost::alloc::vec::Vec<PrimaryKeySchema>,
    /// PlainBuffer-encoded primary keys, in ascending order.
    #[prost(bytes = "vec", repeated, tag = "3")]
    pub split_points: ::prost::alloc::vec::Vec<::prost::alloc::vec::Vec<u8>>,
    #[prost(message, repeated, tag = "4")]
    pub locations: ::prost::alloc::vec::Vec<SplitLocation>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum FilterType {
    FtSingleColumnValue = 1,
    FtCompositeColumnValue = 2,
    FtColumnPagination = 3,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ComparatorType {
    CtEqual = 1,
    CtNotEqual = 2,
    CtGreaterThan = 3,
    CtGreaterEqual = 4,
    CtLessThan = 5,
    CtLessEqual = 6,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum LogicalOperator {
    LoNot = 1,
    LoAnd = 2,
    LoOr = 3,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Filter {
    #[prost(enumeration = "FilterType", required, tag = "1")]
    pub r#type: i32,
    /// A serialized `SingleColumnValueFilter` or `CompositeColumnValueFilter`.
    #[prost(bytes = "vec", required, tag = "2")]
    pub filter: ::prost::alloc::vec::Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SingleColumnValueFilter {
    #[prost(enumeration = "ComparatorType", required, tag = "1")]
    pub comparator: i32,
    #[prost(string, required, tag = "2")]
    pub column_name: ::prost::alloc::string::String,
    /// A bare PlainBuffer cell value: type byte plus payload.
    #[prost(bytes = "vec", required, tag = "3")]
    pub column_value: ::prost::alloc::vec::Vec<u8>,
    #[prost(bool, required, tag = "4")]
    pub filter_if_missing: bool,
    #[prost(bool, required, tag = "5")]
    pub latest_version_only: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CompositeColumnValueFilter {
    #[prost(enumeration = "LogicalOperator", required, tag = "1")]
    pub combinator: i32,
    #[prost(message, repeated, tag = "2")]
    pub sub_filters: ::prost::alloc::vec::Vec<Filter>,
}
