use std::sync::Arc;
use std::time::Duration;

use tablestore::protocol::messages::{GetRowRequest, PutRowRequest};
use tablestore::types::{Attribute, PrimaryKey, RowPutChange};
use tablestore::writer::{BatchWriter, BatchWriterConfig};
use tablestore::{ClientBuilder, Credential};

const TABLE: &str = "demo";

#[tokio::main]
async fn main() {
    let endpoint = std::env::var("OTS_ENDPOINT").expect("set OTS_ENDPOINT");
    let instance = std::env::var("OTS_INSTANCE").expect("set OTS_INSTANCE");
    let access_key_id = std::env::var("OTS_ACCESS_KEY_ID").expect("set OTS_ACCESS_KEY_ID");
    let access_key_secret =
        std::env::var("OTS_ACCESS_KEY_SECRET").expect("set OTS_ACCESS_KEY_SECRET");

    let client = ClientBuilder::new(
        endpoint,
        instance,
        Credential::new(access_key_id, access_key_secret),
    )
    .request_timeout(Duration::from_secs(10))
    .build()
    .unwrap();

    // one direct write
    let pk = PrimaryKey::new().column("user_id", 1i64);
    let change = RowPutChange::new(TABLE, pk.clone())
        .attribute(Attribute::new("name", "direct write"));
    client.put_row(PutRowRequest::new(change)).await.unwrap();

    // a burst of writes through the batch writer; rows arriving within
    // one nap window leave as a single batched request
    let writer = Arc::new(
        BatchWriter::new(client.clone(), BatchWriterConfig::default()).unwrap(),
    );
    let mut handles = Vec::new();
    for user_id in 2i64..100 {
        let writer = Arc::clone(&writer);
        handles.push(tokio::spawn(async move {
            let change = RowPutChange::new(
                TABLE,
                PrimaryKey::new().column("user_id", user_id),
            )
            .attribute(Attribute::new("name", format!("batched write {user_id}")));
            writer.put_row(change).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }
    writer.flush().await;
    writer.close().await;

    // read one row back
    let response = client.get_row(GetRowRequest::new(TABLE, pk)).await.unwrap();
    println!("row: {:?}", response.row);

    client.close().await;
}
