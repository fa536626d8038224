use binance_usdm::exchanges::binance_perp::streams::names;
use binance_usdm::{build_connector, ExchangeConfig, StreamEvent};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    // Public endpoints only; set BINANCE_API_KEY / BINANCE_SECRET_KEY to sign requests.
    let config = ExchangeConfig::from_env("BINANCE").unwrap_or_else(|_| ExchangeConfig::read_only());
    let connector = build_connector(config)?;

    connector.rest().ping().await?;
    let server_time = connector.rest().server_time().await?;
    println!("Server time: {}", server_time);

    let ticker = connector.rest().ticker_price("BTCUSDT").await?;
    println!("BTCUSDT last price: {}", ticker.price);

    let token = CancellationToken::new();
    let streams = vec![names::agg_trade("BTCUSDT"), names::mark_price("BTCUSDT", true)];
    let (connection, mut events) = connector.subscribe_market(&streams, &token).await?;

    let deadline = tokio::time::sleep(Duration::from_secs(10));
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            () = &mut deadline => break,
            event = events.recv() => match event {
                Some(StreamEvent::AggTrade(trade)) => {
                    println!("trade {} {} @ {}", trade.symbol, trade.quantity, trade.price);
                }
                Some(StreamEvent::MarkPriceUpdate(mark)) => {
                    println!("mark {} {}", mark.symbol, mark.mark_price);
                }
                Some(other) => println!("event {}", other.event_type()),
                None => break,
            },
        }
    }

    token.cancel();
    println!("stream ended: {:?}", connection.join().await);
    Ok(())
}
