use embassy_futures::select::{select, Either};
use embassy_sync::{blocking_mutex::raw::RawMutex, channel::Receiver};
use log::{debug, error, info, warn};

use crate::{
    endpoint::{Dialer, EndpointClient, ResponseValidator},
    error::CycleError,
    station::{ConnectionManager, StationDriver},
    types::{StationEvent, STATION_EVENT_QUEUE},
};

/// One wake: associate, run the endpoint exchange, tear the association down.
///
/// Station events are dispatched for as long as the cycle runs. Shutdown runs
/// whether or not the earlier stages succeeded; the first failing stage wins
/// and a shutdown failure only surfaces when everything before it succeeded.
pub async fn run_wake_cycle<M, S, D, V, const N: usize>(
    station: &ConnectionManager<'_, M, S>,
    endpoint: &mut EndpointClient<'_, D, V, N>,
    events: Receiver<'_, M, StationEvent, STATION_EVENT_QUEUE>,
) -> Result<(), CycleError>
where
    M: RawMutex,
    S: StationDriver,
    D: Dialer,
    V: ResponseValidator,
{
    station
        .driver()
        .prepare()
        .await
        .map_err(CycleError::Platform)?;

    let stale = events.len();
    if stale > 0 {
        debug!("discarding {} station events from an earlier wake", stale);
        events.clear();
    }

    match select(station.dispatch(events), sequence(station, endpoint)).await {
        Either::First(never) => never,
        Either::Second(result) => result,
    }
}

async fn sequence<M, S, D, V, const N: usize>(
    station: &ConnectionManager<'_, M, S>,
    endpoint: &mut EndpointClient<'_, D, V, N>,
) -> Result<(), CycleError>
where
    M: RawMutex,
    S: StationDriver,
    D: Dialer,
    V: ResponseValidator,
{
    let outcome = match station.connect().await {
        Ok(()) => endpoint
            .request_and_validate()
            .await
            .map_err(CycleError::from),
        Err(err) => Err(CycleError::from(err)),
    };

    let teardown = station.shutdown().await;
    match (outcome, teardown) {
        (Ok(()), Ok(())) => {
            info!("wake cycle complete");
            Ok(())
        }
        (Ok(()), Err(err)) => {
            warn!("station shutdown failed: {}", err);
            Err(CycleError::Shutdown(err))
        }
        (Err(err), teardown) => {
            if let Err(shutdown_err) = teardown {
                warn!("station shutdown after failure also failed: {}", shutdown_err);
            }
            error!("wake cycle failed in {} stage: {}", err.stage(), err);
            Err(err)
        }
    }
}
