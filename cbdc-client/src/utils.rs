// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::eth_client::{EthClient, EthClientInner};
use std::time::{Duration, Instant};

/// Poll the node behind `client` until it reports listening, or give up after
/// `timeout`. The client's status reflects the last probe either way.
pub async fn wait_for_node_to_be_up<P: EthClientInner>(
    client: &mut EthClient<P>,
    timeout: Duration,
) -> anyhow::Result<()> {
    let now = Instant::now();
    loop {
        if client.probe().await.is_connected() {
            break;
        }
        if now.elapsed() > timeout {
            anyhow::bail!(
                "Node {} is not up and running after {} seconds",
                client.rpc_url(),
                timeout.as_secs()
            );
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    Ok(())
}
