pub mod generated {
    tonic::include_proto!("sqs.ingest.v1");
}
