//! Room join glue around the LiveKit SDK.
//!
//! The SDK owns media transport and room state. This module fetches a
//! token from the token server, connects, logs room events and runs the
//! local mic level meter while connected. Any failure surfaces as an
//! error; recovery is rerunning the command.

use anyhow::{Context, Result};
use livekit::prelude::*;
use serde::Deserialize;
use tracing::{info, warn};

use crate::audio::{LevelMonitor, MicCapture};
use crate::cli;

/// Wire shape of the token server response.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    #[serde(rename = "livekitUrl")]
    pub livekit_url: String,
}

pub struct JoinOptions {
    pub identity: String,
    pub room: String,
    pub server: String,
    pub input_device: Option<String>,
    pub meter_height: i32,
}

/// Fetch an access token for `identity` in `room` from the token server.
pub async fn fetch_token(server: &str, identity: &str, room: &str) -> Result<TokenResponse> {
    let url = format!("{}/token", server.trim_end_matches('/'));
    let response = reqwest::Client::new()
        .get(&url)
        .query(&[("identity", identity), ("room", room)])
        .send()
        .await
        .context("Failed to reach the token server")?
        .error_for_status()
        .context("Token server rejected the request")?;

    response
        .json()
        .await
        .context("Failed to parse the token response")
}

/// Join a room and stay connected until Ctrl-C.
pub async fn run_join(options: JoinOptions) -> Result<()> {
    let credentials = fetch_token(&options.server, &options.identity, &options.room).await?;

    info!(
        "Connecting to room {} as {}",
        options.room, options.identity
    );
    let (room, mut events) = Room::connect(
        &credentials.livekit_url,
        &credentials.token,
        RoomOptions::default(),
    )
    .await
    .context("Failed to connect to the room")?;
    info!("Connected to room {}", room.name());

    // Join proceeds without the meter when no microphone is available.
    let capture = match MicCapture::open(options.input_device.as_deref()) {
        Ok(capture) => Some(capture),
        Err(e) => {
            warn!("Mic level meter disabled: {:#}", e);
            None
        }
    };

    let mut monitor = LevelMonitor::new();
    let meter = cli::level_meter(options.meter_height);
    if let Some(capture) = &capture {
        let bar = meter.clone();
        monitor.start(capture.level_source(), options.meter_height, move |level| {
            bar.set_position(level.max(0) as u64);
        })?;
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Leaving room");
                break;
            }
            event = events.recv() => match event {
                Some(event) => log_room_event(&event),
                None => {
                    info!("Room event stream closed");
                    break;
                }
            },
        }
    }

    monitor.stop();
    meter.finish_and_clear();
    if let Some(capture) = capture {
        capture.close();
    }
    room.close().await.context("Failed to leave the room")?;

    Ok(())
}

fn log_room_event(event: &RoomEvent) {
    match event {
        RoomEvent::ParticipantConnected(participant) => {
            info!("Participant connected: {}", participant.identity());
        }
        RoomEvent::ParticipantDisconnected(participant) => {
            info!("Participant disconnected: {}", participant.identity());
        }
        RoomEvent::TrackSubscribed {
            publication,
            participant,
            ..
        } => {
            info!(
                "Subscribed to track {} from {}",
                publication.name(),
                participant.identity()
            );
        }
        RoomEvent::TrackUnsubscribed {
            publication,
            participant,
            ..
        } => {
            info!(
                "Unsubscribed from track {} of {}",
                publication.name(),
                participant.identity()
            );
        }
        RoomEvent::Disconnected { reason } => {
            warn!("Disconnected from room: {:?}", reason);
        }
        _ => {}
    }
}
