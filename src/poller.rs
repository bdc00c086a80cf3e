/*
 *  poller.rs
 *
 *  NoiseMon - keep it down
 *	(c) 2020-26 Stuart Hunter
 *
 *  Tick -> fetch -> update loop, publishing state over a watch channel
 *
 *	This program is free software: you can redistribute it and/or modify
 *	it under the terms of the GNU General Public License as published by
 *	the Free Software Foundation, either version 3 of the License, or
 *	(at your option) any later version.
 *
 *	This program is distributed in the hope that it will be useful,
 *	but WITHOUT ANY WARRANTY; without even the implied warranty of
 *	MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *	GNU General Public License for more details.
 *
 *	See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *	Public License.
 *
 */

use chrono::Utc;
use log::{debug, error, info};
use tokio::sync::watch;

use crate::aggregator::{update, MonitorState, PollEvent};
use crate::client::{FetchOutcome, ReadingSource};
use crate::scheduler::{StopSignal, Ticker};

pub struct Poller<S, T> {
    source: S,
    ticker: T,
    stop: StopSignal,
    state_tx: watch::Sender<MonitorState>,
}

impl<S: ReadingSource, T: Ticker> Poller<S, T> {
    /// Returns the poller and a receiver that sees every published state.
    pub fn new(
        source: S,
        ticker: T,
        stop: StopSignal,
        initial: MonitorState,
    ) -> (Self, watch::Receiver<MonitorState>) {
        let (state_tx, state_rx) = watch::channel(initial);
        (Self { source, ticker, stop, state_tx }, state_rx)
    }

    /// Fetch once and turn whatever happened into a [`PollEvent`].
    pub async fn poll_once(&mut self) -> PollEvent {
        match self.source.fetch().await {
            Ok(FetchOutcome::Payload(payload)) => PollEvent::Sample {
                payload,
                polled_at: Utc::now(),
            },
            Ok(FetchOutcome::NoData) => {
                debug!("Sensor has no data yet");
                PollEvent::NoData
            }
            Err(e) => {
                error!("Error fetching sensor data: {}", e);
                PollEvent::Failed(e.to_string())
            }
        }
    }

    /// Runs until the stop signal fires or the ticker is exhausted.
    /// Returns the final state.
    pub async fn run(mut self) -> MonitorState {
        info!("Sensor polling started");
        loop {
            tokio::select! {
                biased;
                _ = self.stop.cancelled() => {
                    info!("Sensor polling received stop signal. Exiting.");
                    break;
                }
                alive = self.ticker.tick() => {
                    if !alive {
                        info!("Sensor polling ticker exhausted. Exiting.");
                        break;
                    }
                }
            }

            let event = self.poll_once().await;
            let state = update(self.state_tx.borrow().clone(), event);
            self.state_tx.send_replace(state);
        }
        self.state_tx.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::FeedStatus;
    use crate::client::SensorClientError;
    use crate::devices::DeviceBoard;
    use crate::reading::SensorPayload;
    use crate::scheduler::ManualTicker;
    use async_trait::async_trait;
    use std::collections::VecDeque;

    /// Replays canned outcomes, then reports no data forever.
    struct ScriptedSource {
        script: VecDeque<Result<FetchOutcome, SensorClientError>>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<FetchOutcome, SensorClientError>>) -> Self {
            Self { script: script.into() }
        }
    }

    #[async_trait]
    impl ReadingSource for ScriptedSource {
        async fn fetch(&mut self) -> Result<FetchOutcome, SensorClientError> {
            self.script.pop_front().unwrap_or(Ok(FetchOutcome::NoData))
        }
    }

    fn value(v: f64) -> Result<FetchOutcome, SensorClientError> {
        Ok(FetchOutcome::Payload(SensorPayload {
            value: Some(v),
            samples: Some(4),
            timestamp: None,
        }))
    }

    fn initial() -> MonitorState {
        MonitorState::new(20, 150.0, DeviceBoard::default())
    }

    #[tokio::test]
    async fn test_ticks_drive_updates() {
        let source = ScriptedSource::new(vec![
            value(30.0),
            value(45.0),
            value(160.0),
            value(170.0),
            value(140.0),
        ]);
        let (tx, ticker) = ManualTicker::new();
        let (poller, rx) = Poller::new(source, ticker, StopSignal::new(), initial());

        for _ in 0..5 {
            tx.send(()).unwrap();
        }
        drop(tx);
        let last = poller.run().await;

        assert_eq!(last.polls, 5);
        assert_eq!(last.history.len(), 5);
        assert_eq!(last.alerts.len(), 1);
        assert!(!last.alert.is_active());
        assert_eq!(*rx.borrow(), last);
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_polling() {
        let source = ScriptedSource::new(vec![
            value(50.0),
            Err(SensorClientError::HttpStatus(503)),
            Ok(FetchOutcome::NoData),
            value(55.0),
        ]);
        let (tx, ticker) = ManualTicker::new();
        let (poller, mut rx) = Poller::new(source, ticker, StopSignal::new(), initial());
        let handle = tokio::spawn(poller.run());

        tx.send(()).unwrap();
        tx.send(()).unwrap();
        rx.wait_for(|s| s.polls == 2).await.unwrap();
        assert_eq!(rx.borrow().status.error_message(), Some("HTTP error! status: 503"));
        assert_eq!(rx.borrow().history.len(), 1);

        tx.send(()).unwrap();
        tx.send(()).unwrap();
        drop(tx);
        let last = handle.await.unwrap();
        assert_eq!(last.polls, 4);
        assert_eq!(last.status, FeedStatus::Live);
        assert_eq!(last.history.values(), vec![50.0, 55.0]);
    }

    #[tokio::test]
    async fn test_stop_signal_ends_loop() {
        let source = ScriptedSource::new(Vec::new());
        let (_tx, ticker) = ManualTicker::new();
        let stop = StopSignal::new();
        let (poller, _rx) = Poller::new(source, ticker, stop.clone(), initial());
        let handle = tokio::spawn(poller.run());

        stop.cancel();
        let last = handle.await.unwrap();
        assert_eq!(last.polls, 0);
        assert_eq!(last.status, FeedStatus::Loading);
    }
}
