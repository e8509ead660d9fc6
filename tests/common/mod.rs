//! An in-process mock TableStore backend.
//!
//! Listens on a loopback TCP port, speaks just enough HTTP/1.1 and the
//! 2015-12-31 protobuf protocol to serve the data verbs against an
//! in-memory row store. Signatures and body digests of incoming requests
//! are verified with the same scheme the client signs with.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use prost::Message;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use tablestore::protocol::pb;
use tablestore::protocol::plainbuffer::{reader, writer};
use tablestore::protocol::signer;
use tablestore::types::{
    Attribute, AttributeValue, PrimaryKey, PrimaryKeyValue, Row, RowPutChange,
};

pub const ACCESS_KEY_ID: &str = "mock-access-key-id";
pub const ACCESS_KEY_SECRET: &str = "mock-access-key-secret";
pub const INSTANCE: &str = "mock-instance";

mod update_blob;

use update_blob::{parse_write_blob, UpdateOp, WriteBlob};

#[derive(Debug, Clone)]
pub struct InjectedError {
    pub status: u16,
    pub code: String,
    pub message: String,
}

#[derive(Default)]
struct Store {
    /// Rows per table, unordered; scans sort on demand.
    tables: HashMap<String, Vec<Row>>,
    /// Errors served before any real handling, one per request.
    inject: VecDeque<InjectedError>,
    request_count: u64,
    auto_increment: i64,
}

pub struct MockServer {
    endpoint: String,
    store: Arc<Mutex<Store>>,
    handle: tokio::task::JoinHandle<()>,
}

impl MockServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let store = Arc::new(Mutex::new(Store::default()));

        let accept_store = Arc::clone(&store);
        let handle = tokio::spawn(async move {
            loop {
                let Ok((socket, _)) = listener.accept().await else {
                    return;
                };
                let store = Arc::clone(&accept_store);
                tokio::spawn(serve_connection(socket, store));
            }
        });

        Self {
            endpoint: format!("http://127.0.0.1:{port}"),
            store,
            handle,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Serves `error` instead of handling the next request.
    pub fn fail_next(&self, status: u16, code: &str, message: &str) {
        self.store.lock().inject.push_back(InjectedError {
            status,
            code: code.to_string(),
            message: message.to_string(),
        });
    }

    pub fn request_count(&self) -> u64 {
        self.store.lock().request_count
    }

    /// All rows of a table, sorted by key.
    pub fn rows(&self, table: &str) -> Vec<Row> {
        let store = self.store.lock();
        let mut rows = store.tables.get(table).cloned().unwrap_or_default();
        rows.sort_by(|a, b| a.primary_key.compare(&b.primary_key).unwrap());
        rows
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve_connection(mut socket: TcpStream, store: Arc<Mutex<Store>>) {
    let mut buf = Vec::new();
    loop {
        // gather one full request
        let (path, headers, body) = loop {
            if let Some(parsed) = try_parse_request(&buf) {
                let (consumed, path, headers, body) = parsed;
                buf.drain(..consumed);
                break (path, headers, body);
            }
            let mut chunk = [0u8; 4096];
            match socket.read(&mut chunk).await {
                Ok(0) | Err(_) => return,
                Ok(n) => buf.extend_from_slice(&chunk[..n]),
            }
        };

        let (status, body) = handle_request(&store, &path, &headers, &body);
        let response = render_response(status, &body);
        if socket.write_all(&response).await.is_err() {
            return;
        }
    }
}

type ParsedRequest = (usize, String, HashMap<String, String>, Vec<u8>);

fn try_parse_request(buf: &[u8]) -> Option<ParsedRequest> {
    let head_end = buf.windows(4).position(|w| w == b"\r\n\r\n")? + 4;
    let head = std::str::from_utf8(&buf[..head_end]).ok()?;
    let mut lines = head.split("\r\n");
    let request_line = lines.next()?;
    let path = request_line.split(' ').nth(1)?.trim_start_matches('/');

    let mut headers = HashMap::new();
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        }
    }
    let content_length: usize = headers.get("content-length")?.parse().ok()?;
    if buf.len() < head_end + content_length {
        return None;
    }
    let body = buf[head_end..head_end + content_length].to_vec();
    Some((head_end + content_length, path.to_string(), headers, body))
}

fn render_response(status: u16, body: &[u8]) -> Vec<u8> {
    let reason = match status {
        200 => "OK",
        400 => "Bad Request",
        403 => "Forbidden",
        404 => "Not Found",
        _ => "Error",
    };
    let mut response = format!(
        "HTTP/1.1 {status} {reason}\r\n\
         content-length: {}\r\n\
         x-ots-requestid: {}\r\n\
         x-ots-contentmd5: {}\r\n\
         x-ots-date: {}\r\n\r\n",
        body.len(),
        format!("mock-{:08x}", rand_id()),
        signer::content_md5(body),
        signer::format_date(Utc::now()),
    )
    .into_bytes();
    response.extend_from_slice(body);
    response
}

fn rand_id() -> u32 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0)
}

fn error_body(code: &str, message: &str) -> Vec<u8> {
    pb::Error {
        code: code.to_string(),
        message: Some(message.to_string()),
    }
    .encode_to_vec()
}

fn handle_request(
    store: &Mutex<Store>,
    path: &str,
    headers: &HashMap<String, String>,
    body: &[u8],
) -> (u16, Vec<u8>) {
    {
        let mut store = store.lock();
        store.request_count += 1;
        if let Some(injected) = store.inject.pop_front() {
            return (
                injected.status,
                error_body(&injected.code, &injected.message),
            );
        }
    }

    if let Err(response) = verify_request(path, headers, body) {
        return response;
    }

    let mut store = store.lock();
    match path {
        "PutRow" => put_row(&mut store, body),
        "GetRow" => get_row(&mut store, body),
        "UpdateRow" => update_row(&mut store, body),
        "DeleteRow" => delete_row(&mut store, body),
        "GetRange" => get_range(&mut store, body),
        "BatchGetRow" => batch_get_row(&mut store, body),
        "BatchWriteRow" => batch_write_row(&mut store, body),
        "ListTable" => list_table(&store),
        _ => (
            400,
            error_body("OTSParameterInvalid", &format!("unhandled action {path}")),
        ),
    }
}

/// Checks digest and signature the way the real frontend would.
fn verify_request(
    path: &str,
    headers: &HashMap<String, String>,
    body: &[u8],
) -> Result<(), (u16, Vec<u8>)> {
    let digest = signer::content_md5(body);
    if headers.get(signer::HEADER_CONTENT_MD5) != Some(&digest) {
        return Err((400, error_body("OTSParameterInvalid", "body digest mismatch")));
    }

    let action = tablestore::protocol::action::Action::ALL
        .into_iter()
        .find(|a| a.name() == path)
        .ok_or_else(|| (400, error_body("OTSParameterInvalid", "unknown action")))?;
    let signable: Vec<(String, String)> = headers
        .iter()
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();
    let want = signer::signature(action, &signable, ACCESS_KEY_SECRET);
    if headers.get(signer::HEADER_SIGNATURE) != Some(&want) {
        return Err((403, error_body("OTSAuthFailed", "signature mismatch")));
    }
    Ok(())
}

fn consumed(read: i32, write: i32) -> pb::ConsumedCapacity {
    pb::ConsumedCapacity {
        capacity_unit: pb::CapacityUnit {
            read: Some(read),
            write: Some(write),
        },
    }
}

fn encode_row(row: &Row) -> Vec<u8> {
    let mut change = RowPutChange::new("ignored", row.primary_key.clone());
    for attr in &row.attributes {
        change = change.attribute(attr.clone());
    }
    writer::put_change(&change).unwrap().to_vec()
}

fn find_row<'a>(rows: &'a [Row], pk: &PrimaryKey) -> Option<&'a Row> {
    rows.iter()
        .find(|row| matches!(row.primary_key.compare(pk), Ok(std::cmp::Ordering::Equal)))
}

fn upsert_row(rows: &mut Vec<Row>, row: Row) {
    rows.retain(|existing| {
        !matches!(
            existing.primary_key.compare(&row.primary_key),
            Ok(std::cmp::Ordering::Equal)
        )
    });
    rows.push(row);
}

fn remove_row(rows: &mut Vec<Row>, pk: &PrimaryKey) {
    rows.retain(|existing| {
        !matches!(
            existing.primary_key.compare(pk),
            Ok(std::cmp::Ordering::Equal)
        )
    });
}

/// Auto-increment placeholders become distinct integers.
fn materialize_pk(store: &mut Store, pk: PrimaryKey) -> PrimaryKey {
    let mut out = PrimaryKey::new();
    for col in pk.iter() {
        let value = if col.value == PrimaryKeyValue::AutoIncrement {
            store.auto_increment += 1;
            PrimaryKeyValue::Integer(1_000_000 + store.auto_increment)
        } else {
            col.value.clone()
        };
        out = out.column(col.name.clone(), value);
    }
    out
}

fn apply_update(existing: Option<&Row>, pk: &PrimaryKey, ops: &[UpdateOp]) -> Row {
    let mut attributes: Vec<Attribute> = existing.map(|r| r.attributes.clone()).unwrap_or_default();
    for op in ops {
        match op {
            UpdateOp::Put(attr) => {
                attributes.retain(|a| a.name != attr.name || a.timestamp != attr.timestamp);
                attributes.push(attr.clone());
            }
            UpdateOp::DeleteOneVersion { name, timestamp } => {
                attributes.retain(|a| a.name != *name || a.timestamp != Some(*timestamp));
            }
            UpdateOp::DeleteAllVersions { name } => {
                attributes.retain(|a| a.name != *name);
            }
        }
    }
    Row {
        primary_key: pk.clone(),
        attributes,
    }
}

fn returned_row(pk: &PrimaryKey, return_content: Option<&pb::ReturnContent>) -> Option<Vec<u8>> {
    let wants_pk = return_content
        .and_then(|rc| rc.return_type)
        .map(|rt| rt == pb::ReturnType::RtPk as i32)
        .unwrap_or(false);
    if !wants_pk {
        return None;
    }
    Some(encode_row(&Row {
        primary_key: pk.clone(),
        attributes: Vec::new(),
    }))
}

fn put_row(store: &mut Store, body: &[u8]) -> (u16, Vec<u8>) {
    let Ok(request) = pb::PutRowRequest::decode(body) else {
        return (400, error_body("OTSParameterInvalid", "undecodable body"));
    };
    let Ok(row) = reader::read_row(&request.row) else {
        return (400, error_body("OTSParameterInvalid", "undecodable row"));
    };
    let pk = materialize_pk(store, row.primary_key);
    let row = Row {
        primary_key: pk.clone(),
        attributes: row.attributes,
    };
    upsert_row(store.tables.entry(request.table_name).or_default(), row);

    let response = pb::PutRowResponse {
        consumed: consumed(0, 1),
        row: returned_row(&pk, request.return_content.as_ref()),
    };
    (200, response.encode_to_vec())
}

fn get_row(store: &mut Store, body: &[u8]) -> (u16, Vec<u8>) {
    let Ok(request) = pb::GetRowRequest::decode(body) else {
        return (400, error_body("OTSParameterInvalid", "undecodable body"));
    };
    let Ok(pk) = reader::read_primary_key(&request.primary_key) else {
        return (400, error_body("OTSParameterInvalid", "undecodable key"));
    };
    let rows = store.tables.entry(request.table_name).or_default();
    let row = find_row(rows, &pk).map(encode_row).unwrap_or_default();
    let response = pb::GetRowResponse {
        consumed: consumed(1, 0),
        row,
    };
    (200, response.encode_to_vec())
}

fn update_row(store: &mut Store, body: &[u8]) -> (u16, Vec<u8>) {
    let Ok(request) = pb::UpdateRowRequest::decode(body) else {
        return (400, error_body("OTSParameterInvalid", "undecodable body"));
    };
    let Ok(WriteBlob { primary_key, ops, .. }) = parse_write_blob(&request.row_change) else {
        return (400, error_body("OTSParameterInvalid", "undecodable change"));
    };
    let rows = store.tables.entry(request.table_name).or_default();
    let next = apply_update(find_row(rows, &primary_key), &primary_key, &ops);
    upsert_row(rows, next);

    let response = pb::UpdateRowResponse {
        consumed: consumed(0, 1),
        row: returned_row(&primary_key, request.return_content.as_ref()),
    };
    (200, response.encode_to_vec())
}

fn delete_row(store: &mut Store, body: &[u8]) -> (u16, Vec<u8>) {
    let Ok(request) = pb::DeleteRowRequest::decode(body) else {
        return (400, error_body("OTSParameterInvalid", "undecodable body"));
    };
    let Ok(WriteBlob { primary_key, .. }) = parse_write_blob(&request.primary_key) else {
        return (400, error_body("OTSParameterInvalid", "undecodable key"));
    };
    remove_row(store.tables.entry(request.table_name).or_default(), &primary_key);

    let response = pb::DeleteRowResponse {
        consumed: consumed(0, 1),
        row: None,
    };
    (200, response.encode_to_vec())
}

fn get_range(store: &mut Store, body: &[u8]) -> (u16, Vec<u8>) {
    let Ok(request) = pb::GetRangeRequest::decode(body) else {
        return (400, error_body("OTSParameterInvalid", "undecodable body"));
    };
    let (Ok(start), Ok(end)) = (
        reader::read_primary_key(&request.inclusive_start_primary_key),
        reader::read_primary_key(&request.exclusive_end_primary_key),
    ) else {
        return (400, error_body("OTSParameterInvalid", "undecodable bound"));
    };

    let mut rows: Vec<Row> = store
        .tables
        .entry(request.table_name)
        .or_default()
        .iter()
        .filter(|row| {
            let after_start = !matches!(
                row.primary_key.compare(&start),
                Ok(std::cmp::Ordering::Less)
            );
            let before_end = matches!(row.primary_key.compare(&end), Ok(std::cmp::Ordering::Less));
            after_start && before_end
        })
        .cloned()
        .collect();
    rows.sort_by(|a, b| a.primary_key.compare(&b.primary_key).unwrap());
    if request.direction == pb::Direction::Backward as i32 {
        rows.reverse();
    }

    let mut blob = Vec::new();
    for row in &rows {
        let encoded = encode_row(row);
        if blob.is_empty() {
            blob = encoded;
        } else {
            blob.extend_from_slice(&encoded[4..]);
        }
    }

    let response = pb::GetRangeResponse {
        consumed: consumed(1, 0),
        rows: blob,
        next_start_primary_key: None,
    };
    (200, response.encode_to_vec())
}

fn batch_get_row(store: &mut Store, body: &[u8]) -> (u16, Vec<u8>) {
    let Ok(request) = pb::BatchGetRowRequest::decode(body) else {
        return (400, error_body("OTSParameterInvalid", "undecodable body"));
    };

    let mut tables = Vec::new();
    for table in request.tables {
        let rows_in_store = store.tables.entry(table.table_name.clone()).or_default();
        let mut rows = Vec::new();
        for key in &table.primary_key {
            let row = match reader::read_primary_key(key) {
                Ok(pk) => find_row(rows_in_store, &pk).map(encode_row),
                Err(_) => None,
            };
            rows.push(pb::RowInBatchGetRowResponse {
                is_ok: true,
                error: None,
                consumed: Some(consumed(1, 0)),
                row,
            });
        }
        tables.push(pb::TableInBatchGetRowResponse {
            table_name: table.table_name,
            rows,
        });
    }

    let response = pb::BatchGetRowResponse { tables };
    (200, response.encode_to_vec())
}

fn batch_write_row(store: &mut Store, body: &[u8]) -> (u16, Vec<u8>) {
    let Ok(request) = pb::BatchWriteRowRequest::decode(body) else {
        return (400, error_body("OTSParameterInvalid", "undecodable body"));
    };

    let mut tables = Vec::new();
    for table in request.tables {
        let mut rows = Vec::new();
        for row in &table.rows {
            let result = apply_batch_write(store, &table.table_name, row);
            rows.push(result);
        }
        tables.push(pb::TableInBatchWriteRowResponse {
            table_name: table.table_name,
            rows,
        });
    }

    let response = pb::BatchWriteRowResponse { tables };
    (200, response.encode_to_vec())
}

fn apply_batch_write(
    store: &mut Store,
    table_name: &str,
    row: &pb::RowInBatchWriteRowRequest,
) -> pb::RowInBatchWriteRowResponse {
    let ok = |returned: Option<Vec<u8>>| pb::RowInBatchWriteRowResponse {
        is_ok: true,
        error: None,
        consumed: Some(consumed(0, 1)),
        row: returned,
    };
    let fail = |code: &str, message: &str| pb::RowInBatchWriteRowResponse {
        is_ok: false,
        error: Some(pb::Error {
            code: code.to_string(),
            message: Some(message.to_string()),
        }),
        consumed: None,
        row: None,
    };

    let Ok(blob) = parse_write_blob(&row.row_change) else {
        return fail("OTSParameterInvalid", "undecodable change");
    };

    if row.r#type == pb::OperationType::Put as i32 {
        let pk = materialize_pk(store, blob.primary_key);
        let attributes = blob
            .ops
            .iter()
            .filter_map(|op| match op {
                UpdateOp::Put(attr) => Some(attr.clone()),
                _ => None,
            })
            .collect();
        let returned = returned_row(&pk, row.return_content.as_ref());
        upsert_row(
            store.tables.entry(table_name.to_string()).or_default(),
            Row {
                primary_key: pk,
                attributes,
            },
        );
        ok(returned)
    } else if row.r#type == pb::OperationType::Update as i32 {
        let pk = blob.primary_key.clone();
        let rows = store.tables.entry(table_name.to_string()).or_default();
        let next = apply_update(find_row(rows, &pk), &pk, &blob.ops);
        upsert_row(rows, next);
        ok(returned_row(&pk, row.return_content.as_ref()))
    } else if row.r#type == pb::OperationType::Delete as i32 {
        remove_row(
            store.tables.entry(table_name.to_string()).or_default(),
            &blob.primary_key,
        );
        ok(returned_row(&blob.primary_key, row.return_content.as_ref()))
    } else {
        fail("OTSParameterInvalid", "unknown operation type")
    }
}

fn list_table(store: &Store) -> (u16, Vec<u8>) {
    let mut table_names: Vec<String> = store.tables.keys().cloned().collect();
    table_names.sort();
    let response = pb::ListTableResponse { table_names };
    (200, response.encode_to_vec())
}

/// Helpers shared by the end-to-end scenarios.
pub fn attr_value(row: &Row, name: &str) -> Option<AttributeValue> {
    row.attribute(name).map(|a| a.value.clone())
}
