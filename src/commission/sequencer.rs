//! The `sequencer` module feeds transactions to the commission engine in input order.
use std::io::Read;

use csv::{ReaderBuilder, Trim};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::commission::{
    CommissionEngine, CommissionError, IngestError, TRANSACTION_FIELDS, Transaction,
};

/// Owns the commission engine and processes transactions one at a time.
pub struct Sequencer {
    /// The engine holding rules and weekly withdrawal state.
    engine: CommissionEngine,
    /// A channel receiver for incoming transactions.
    receiver: mpsc::Receiver<Transaction>,
}

impl Sequencer {
    pub fn new(engine: CommissionEngine, receiver: mpsc::Receiver<Transaction>) -> Self {
        Sequencer { engine, receiver }
    }

    /// Gets the engine, e.g. to inspect the accumulated weekly state.
    pub fn engine(&self) -> &CommissionEngine {
        &self.engine
    }

    /// Runs the processing loop until every sender is dropped.
    ///
    /// Returns the fees in the order transactions were received, or the
    /// first error, which stops processing and closes the channel.
    pub async fn run(&mut self) -> Result<Vec<String>, CommissionError> {
        let mut fees = Vec::new();
        while let Some(transaction) = self.receiver.recv().await {
            match self.engine.calculate(&transaction) {
                Ok(fee) => fees.push(fee),
                Err(e) => {
                    error!(
                        error = %e,
                        position = fees.len() + 1,
                        user_id = transaction.get_user_id(),
                        "Error calculating commission"
                    );
                    self.receiver.close();
                    return Err(e);
                }
            }
        }
        info!(transactions = fees.len(), "Processed all transactions");
        Ok(fees)
    }
}

/// Reads headerless CSV transaction records and sends them in order.
///
/// Records with fewer than [`TRANSACTION_FIELDS`] fields are logged and
/// skipped. Any other unreadable record stops the input with an error.
/// Returns the number of transactions sent; stops early once the receiving
/// side has gone away.
pub async fn feed_csv<R: Read>(
    input: R,
    sender: mpsc::Sender<Transaction>,
) -> Result<usize, IngestError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(input);

    let mut sent = 0;
    for (index, record) in reader.records().enumerate() {
        let position = index + 1;
        let invalid = |source| IngestError::InvalidRecord {
            record: position,
            source,
        };
        let record = record.map_err(invalid)?;
        if record.len() < TRANSACTION_FIELDS {
            warn!(
                record = position,
                fields = record.len(),
                "Skipping incomplete record"
            );
            continue;
        }
        let transaction: Transaction = record.deserialize(None).map_err(invalid)?;
        if sender.send(transaction).await.is_err() {
            warn!(record = position, "Transaction receiver closed");
            break;
        }
        sent += 1;
    }
    Ok(sent)
}
