//! Load testing for the bridge.

use std::time::{Duration, Instant};

use futures_util::SinkExt;
use tokio_tungstenite::tungstenite::Message;

use tcp_bridge::config::BridgeConfig;

mod common;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_round_trip_latency_under_load() {
    // 1. Setup echo target and bridge
    let backend = common::start_echo_backend().await;
    let bridge = std::sync::Arc::new(common::start_bridge(BridgeConfig::default()).await);

    // 2. Run load: one session per task, many round trips each
    let concurrency = 20;
    let round_trips_per_session = 50;
    let total = concurrency * round_trips_per_session;

    let start = Instant::now();
    let mut tasks = Vec::new();
    for task_id in 0..concurrency {
        let bridge = bridge.clone();
        tasks.push(tokio::spawn(async move {
            let mut ws = bridge.connect(backend).await;
            let mut latencies = Vec::with_capacity(round_trips_per_session);
            for n in 0..round_trips_per_session {
                let payload = format!("{}:{}", task_id, n).into_bytes();
                let sent_at = Instant::now();
                ws.send(Message::binary(payload.clone())).await.unwrap();
                let echoed = common::read_bytes(&mut ws, payload.len()).await;
                assert_eq!(echoed, payload);
                latencies.push(sent_at.elapsed());
            }
            let _ = ws.close(None).await;
            latencies
        }));
    }

    let mut all_latencies: Vec<Duration> = Vec::new();
    for task in tasks {
        all_latencies.extend(task.await.unwrap());
    }

    let duration = start.elapsed();
    assert_eq!(all_latencies.len(), total);

    all_latencies.sort();
    let p50 = all_latencies[all_latencies.len() / 2];
    let p99 = all_latencies[(all_latencies.len() as f64 * 0.99) as usize];

    println!("\n--- Load Test Results ---");
    println!("Sessions:       {}", concurrency);
    println!("Round trips:    {}", total);
    println!("Total Duration: {:?}", duration);
    println!("Round trips/s:  {:.2}", total as f64 / duration.as_secs_f64());
    println!("P50 Latency:    {:?}", p50);
    println!("P99 Latency:    {:?}", p99);
    println!("-------------------------\n");

    bridge.wait_idle().await;
}
