//! Telemetry source client.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::Context;
use bytes::Bytes;
use chrono::Utc;
use futures::future::join_all;
use http::header::{ACCEPT, AUTHORIZATION};
use http::{Method, StatusCode};
use realtime::{Config, Error, HttpRequest, Identity, Provider, Result};
use tracing::{debug, warn};
use urlencoding::encode;

use crate::fallback::{FallbackFleet, details_from_position, placeholder_details};
use crate::model::{VehicleDetails, VehiclePosition};
use crate::normalize::{normalize_fleet, normalize_one};
use crate::raw::{Device, Envelope, TelemetryRecord, TelemetrySnapshot};

/// Authorization scheme used when `TELEMETRY_AUTH_SCHEME` is not configured.
pub const DEFAULT_AUTH_SCHEME: &str = "FlespiToken";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Options shared by every fetch against the telemetry source.
#[derive(Debug, Clone)]
pub struct SourceSettings {
    /// Upper bound for a single request, including the device list.
    pub request_timeout: Duration,

    /// Vehicles returned when the fleet source cannot be used.
    pub fallback: FallbackFleet,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self { request_timeout: DEFAULT_REQUEST_TIMEOUT, fallback: FallbackFleet::seeded() }
    }
}

/// Why a fleet fetch returned the fallback set.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    #[error("device list is empty")]
    EmptyFleet,

    #[error("no device reported a usable position")]
    NoUsablePositions,

    #[error(transparent)]
    Source(#[from] Error),
}

impl FallbackReason {
    /// Whether the source itself failed, as opposed to answering with nothing
    /// usable.
    #[must_use]
    pub const fn is_source_failure(&self) -> bool {
        match self {
            Self::Source(err) => err.is_source_failure(),
            Self::EmptyFleet | Self::NoUsablePositions => false,
        }
    }
}

/// Where the vehicles of a [`FleetBatch`] came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Live,
    Fallback(FallbackReason),
}

/// Result of one fleet fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct FleetBatch {
    pub vehicles: Vec<VehiclePosition>,
    pub origin: Origin,
}

impl FleetBatch {
    fn fallback(settings: &SourceSettings, reason: FallbackReason) -> Self {
        Self { vehicles: settings.fallback.vehicles().to_vec(), origin: Origin::Fallback(reason) }
    }

    #[must_use]
    pub const fn is_live(&self) -> bool {
        matches!(self.origin, Origin::Live)
    }
}

/// Fetches and normalizes the whole fleet.
///
/// Never fails: an unreachable source, a malformed or empty device list, or a
/// fleet in which no device reports a usable position all yield the
/// configured fallback set. A failed telemetry fetch for one device drops
/// that device only.
pub async fn fleet_positions(provider: &impl Provider, settings: &SourceSettings) -> FleetBatch {
    let devices = match list_devices(provider, settings).await {
        Ok(devices) if devices.is_empty() => {
            debug!("device list is empty, using fallback fleet");
            return FleetBatch::fallback(settings, FallbackReason::EmptyFleet);
        }
        Ok(devices) => devices,
        Err(err) => {
            warn!(monotonic_counter.fleet_fallbacks = 1, error = %err, "listing devices failed");
            return FleetBatch::fallback(settings, FallbackReason::Source(err));
        }
    };

    let fetches = devices.iter().map(|device| async move {
        let id = device.id.to_string();
        let snapshot = device_telemetry(provider, &id, settings).await;
        (id, snapshot)
    });

    let mut snapshots = HashMap::new();
    for (id, result) in join_all(fetches).await {
        match result {
            Ok(Some(snapshot)) => {
                snapshots.insert(id, snapshot);
            }
            Ok(None) => debug!(device_id = %id, "device has no telemetry"),
            Err(err) => {
                debug!(
                    monotonic_counter.device_fetch_failures = 1,
                    device_id = %id,
                    error = %err,
                    "skipping device"
                );
            }
        }
    }

    let vehicles = normalize_fleet(&devices, &snapshots);
    if vehicles.is_empty() {
        debug!(devices = devices.len(), "no usable positions, using fallback fleet");
        return FleetBatch::fallback(settings, FallbackReason::NoUsablePositions);
    }

    FleetBatch { vehicles, origin: Origin::Live }
}

/// Fetches live details for one vehicle.
///
/// Never fails. When the vehicle has no live telemetry the record is
/// synthesized from `last_known`, or from a fresh fleet fetch when no last
/// known position was supplied, and finally from a placeholder.
pub async fn vehicle_details(
    provider: &impl Provider, vehicle_id: &str, last_known: Option<&VehiclePosition>,
    settings: &SourceSettings,
) -> VehicleDetails {
    match device_telemetry(provider, vehicle_id, settings).await {
        Ok(Some(snapshot)) => return normalize_one(vehicle_id, &snapshot),
        Ok(None) => debug!(vehicle_id, "no live telemetry for vehicle"),
        Err(err) => {
            warn!(
                monotonic_counter.detail_fallbacks = 1,
                vehicle_id,
                error = %err,
                "fetching vehicle telemetry failed"
            );
        }
    }

    let now = Utc::now().timestamp_millis();
    if let Some(position) = last_known {
        return details_from_position(position, now);
    }

    let fleet = fleet_positions(provider, settings).await;
    fleet.vehicles.iter().find(|vehicle| vehicle.id == vehicle_id).map_or_else(
        || placeholder_details(vehicle_id, now),
        |position| details_from_position(position, now),
    )
}

/// Lists the devices known to the source.
///
/// # Errors
///
/// Returns an error when the source cannot be reached, times out, or answers
/// with a payload that is not a device list.
pub async fn list_devices(
    provider: &impl Provider, settings: &SourceSettings,
) -> Result<Vec<Device>> {
    let body = get(provider, "/gw/devices/all?fields=id,name", settings).await?;
    let envelope: Envelope<Device> = serde_json::from_slice(&body)?;
    Ok(envelope.result)
}

/// Fetches the latest telemetry snapshot for one device.
///
/// Returns `Ok(None)` when the device exists but reports no telemetry.
///
/// # Errors
///
/// Returns an error when the source cannot be reached, times out, does not
/// know the device, or answers with a malformed payload.
pub async fn device_telemetry(
    provider: &impl Provider, device_id: &str, settings: &SourceSettings,
) -> Result<Option<TelemetrySnapshot>> {
    let path = format!("/gw/devices/{}/telemetry/all", encode(device_id));
    let body = get(provider, &path, settings).await?;
    let envelope: Envelope<TelemetryRecord> = serde_json::from_slice(&body)?;

    let snapshot = envelope
        .result
        .into_iter()
        .next()
        .and_then(|record| record.telemetry)
        .filter(|snapshot| !snapshot.is_empty());
    Ok(snapshot)
}

async fn get(provider: &impl Provider, path: &str, settings: &SourceSettings) -> Result<Bytes> {
    let url = Config::get(provider, "TELEMETRY_URL").await.context("getting `TELEMETRY_URL`")?;
    let scheme = Config::get(provider, "TELEMETRY_AUTH_SCHEME")
        .await
        .unwrap_or_else(|_| DEFAULT_AUTH_SCHEME.to_string());
    let token = Identity::access_token(provider).await.context("getting access token")?;

    let request = http::Request::builder()
        .method(Method::GET)
        .uri(format!("{}{path}", url.trim_end_matches('/')))
        .header(AUTHORIZATION, format!("{scheme} {token}"))
        .header(ACCEPT, "application/json")
        .body(Bytes::new())
        .context("building telemetry request")?;

    let fetch = HttpRequest::fetch(provider, request);
    let response = match tokio::time::timeout(settings.request_timeout, fetch).await {
        Ok(Ok(response)) => response,
        Ok(Err(err)) => return Err(Error::SourceUnreachable(format!("GET {path}: {err:#}"))),
        Err(elapsed) => return Err(Error::Timeout(format!("GET {path}: {elapsed}"))),
    };

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(realtime::not_found!("GET {path}"));
    }
    if !status.is_success() {
        return Err(realtime::unreachable_source!("GET {path}: status {status}"));
    }

    Ok(response.into_body())
}
