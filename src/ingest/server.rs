//! The ingest gRPC service (spec §4.8, §6): one `IngestSession` per
//! connection, wire records decoded and skip-on-error before reaching the
//! session's transactional state machine.

use std::pin::Pin;
use std::sync::Arc;

use futures::Stream;
use tokio::sync::broadcast;
use tokio_stream::StreamExt;
use tonic::{Request, Response, Status, Streaming};
use tracing::{info, warn};

use crate::domain::SpreadFactor;
use crate::events::BlockCommitted;
use crate::fees::TakerFeeTable;
use crate::pool::store::PoolStore;

use super::convert::pool_from_record;
use super::proto::generated::ingest_message::Payload as InPayload;
use super::proto::generated::ingest_response::Payload as OutPayload;
use super::proto::generated::ingest_service_server::IngestService;
use super::proto::generated::{Ack, Abort, IngestMessage, IngestResponse};
use super::session::{IngestSession, PushBatch};

pub struct IngestServer {
    store: Arc<PoolStore>,
    fees: Arc<TakerFeeTable>,
    block_committed_tx: broadcast::Sender<BlockCommitted>,
}

impl IngestServer {
    pub fn new(
        store: Arc<PoolStore>,
        fees: Arc<TakerFeeTable>,
        block_committed_tx: broadcast::Sender<BlockCommitted>,
    ) -> Self {
        Self { store, fees, block_committed_tx }
    }
}

type ResponseStream = Pin<Box<dyn Stream<Item = Result<IngestResponse, Status>> + Send + 'static>>;

#[tonic::async_trait]
impl IngestService for IngestServer {
    type StreamStream = ResponseStream;

    async fn stream(
        &self,
        request: Request<Streaming<IngestMessage>>,
    ) -> Result<Response<Self::StreamStream>, Status> {
        let mut incoming = request.into_inner();
        let store = self.store.clone();
        let fees = self.fees.clone();
        let block_committed_tx = self.block_committed_tx.clone();

        let (tx, rx) = tokio::sync::mpsc::channel(16);

        tokio::spawn(async move {
            let mut session = IngestSession::new();

            while let Some(message) = incoming.next().await {
                let message = match message {
                    Ok(m) => m,
                    Err(status) => {
                        warn!(error = %status, "ingest stream error");
                        break;
                    }
                };
                let Some(payload) = message.payload else { continue };

                match payload {
                    InPayload::Begin(begin) => {
                        session.begin(begin.height);
                    }
                    InPayload::Push(batch) => {
                        let mut pools = Vec::with_capacity(batch.pools.len());
                        for record in batch.pools {
                            match pool_from_record(record) {
                                Ok(pool) => pools.push(pool),
                                Err(e) => warn!(error = %e, "skipping unparseable pool record"),
                            }
                        }
                        let taker_fees = batch
                            .taker_fees
                            .into_iter()
                            .filter_map(|entry| {
                                entry.fee.parse::<u64>().ok().map(|fee| {
                                    (entry.denom_a, entry.denom_b, SpreadFactor(fee))
                                })
                            })
                            .collect();

                        let push = PushBatch {
                            pools,
                            taker_fees,
                            updated_denoms: batch.updated_denoms,
                            updated_pool_ids: batch.updated_pool_ids,
                        };
                        if let Err(e) = session.push(push) {
                            let _ = tx
                                .send(Ok(IngestResponse {
                                    payload: Some(OutPayload::Abort(Abort { reason: e.to_string() })),
                                }))
                                .await;
                        }
                    }
                    InPayload::Commit(commit) => match session.commit(commit.height) {
                        Ok(Some((pools, taker_fee_entries, event))) => {
                            store.store(pools);
                            fees.store(taker_fee_entries);
                            info!(height = commit.height, "ingest commit applied");
                            let _ = block_committed_tx.send(event);
                            let _ = tx
                                .send(Ok(IngestResponse {
                                    payload: Some(OutPayload::Ack(Ack { height: commit.height })),
                                }))
                                .await;
                        }
                        Ok(None) => {
                            // Stale commit for a superseded session; ignore.
                        }
                        Err(e) => {
                            let _ = tx
                                .send(Ok(IngestResponse {
                                    payload: Some(OutPayload::Abort(Abort { reason: e.to_string() })),
                                }))
                                .await;
                        }
                    },
                }
            }
        });

        let output = tokio_stream::wrappers::ReceiverStream::new(rx);
        Ok(Response::new(Box::pin(output) as ResponseStream))
    }
}
