//! The end-of-run report.
//!
//! On graceful shutdown the broker renders every counter into a plain-text
//! summary (`Reporte.txt`) with one section per component role and the
//! total count of processed offers.

use crate::dispatcher::Broker;
use std::fmt::Write as _;
use std::path::Path;

/// Render the report text from the broker's current counters.
#[must_use]
pub fn render(broker: &Broker) -> String {
    let mut out = String::new();

    // Writing to a String cannot fail; the results are intentionally unused.
    let _ = writeln!(out, "==== REPORTE CYBERDAY ====");
    let _ = writeln!(out);

    let _ = writeln!(out, "-- Productores --");
    for (client_id, stats) in broker.roster.snapshot() {
        let _ = writeln!(
            out,
            "{client_id}: enviadas={} aceptadas={} rechazadas={}",
            stats.sent, stats.accepted, stats.rejected
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "-- Nodos de almacenamiento --");
    for node in broker.cluster.nodes() {
        let _ = writeln!(
            out,
            "{}: escrituras_ok={} escrituras_fallidas={} activo={}",
            node.node_id(),
            node.writes_ok(),
            node.writes_failed(),
            node.believed_live()
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "-- Consumidores --");
    for consumer in broker.consumers.snapshot() {
        let _ = writeln!(
            out,
            "{}: entregadas={} activo={}",
            consumer.consumer_id,
            consumer.delivered(),
            consumer.is_active()
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Total de ofertas procesadas: {}",
        broker.processed_count()
    );

    out
}

/// Render and write the report file.
///
/// # Errors
///
/// Returns the underlying I/O error when the file cannot be written.
pub fn write_to(broker: &Broker, path: &Path) -> std::io::Result<()> {
    let text = render(broker);
    std::fs::write(path, text)?;
    tracing::info!(path = %path.display(), "report written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::Cluster;
    use crate::registry::ConsumerConnector;
    use cyberday_core::wire::RegisterConsumerRequest;
    use cyberday_core::{ConsumerClient, StorageNodeClient};
    use cyberday_testing::mocks::{MockConsumer, MockStorageNode};
    use std::sync::Arc;

    fn broker() -> Broker {
        let cluster = Cluster::new(vec![
            Arc::new(MockStorageNode::new("DB1")) as Arc<dyn StorageNodeClient>,
            Arc::new(MockStorageNode::new("DB2")),
            Arc::new(MockStorageNode::new("DB3")),
        ]);
        let connect: ConsumerConnector = Arc::new(|addr: &str| {
            Arc::new(MockConsumer::new(addr)) as Arc<dyn ConsumerClient>
        });
        Broker::new(cluster, connect)
    }

    #[test]
    fn report_carries_all_sections() {
        let broker = broker();
        broker.roster.record_sent("Riploy");
        broker.register_consumer(&RegisterConsumerRequest {
            consumer_id: "C-E1".to_string(),
            categories: vec!["null".to_string()],
            stores: vec!["null".to_string()],
            max_price: 0,
            address: "c-e1:50061".to_string(),
        });

        let text = render(&broker);
        assert!(text.contains("-- Productores --"));
        assert!(text.contains("Riploy: enviadas=1"));
        assert!(text.contains("DB2: escrituras_ok=0"));
        assert!(text.contains("C-E1: entregadas=0 activo=true"));
        assert!(text.contains("Total de ofertas procesadas: 0"));
    }

    #[test]
    #[allow(clippy::expect_used)] // Panics: Test will fail if the write fails
    fn report_file_is_written() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("Reporte.txt");
        write_to(&broker(), &path).expect("report should be written");
        let text = std::fs::read_to_string(&path).expect("report should be readable");
        assert!(text.contains("REPORTE CYBERDAY"));
    }
}
