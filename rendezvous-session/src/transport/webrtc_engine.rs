use crate::transport::{
    LinkState, MediaConfig, MediaKind, RemoteStream, TransportConfig, TransportEngine,
    TransportEvent, TransportFactory,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use rendezvous_core::{IceCandidate, SdpKind, SessionDescription};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8, MediaEngine};
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::rtp_transceiver::rtp_codec::{RTCRtpCodecCapability, RTPCodecType};
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_remote::TrackRemote;

const LOCAL_STREAM_ID: &str = "rendezvous-local";

/// Builds [`WebrtcEngine`]s backed by `webrtc-rs` peer connections.
#[derive(Debug, Clone, Default)]
pub struct WebrtcTransportFactory;

impl WebrtcTransportFactory {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TransportFactory for WebrtcTransportFactory {
    async fn create(
        &self,
        config: &TransportConfig,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Box<dyn TransportEngine>> {
        let engine = WebrtcEngine::new(config, events).await?;
        Ok(Box::new(engine))
    }
}

pub struct WebrtcEngine {
    peer_connection: Arc<RTCPeerConnection>,
    local_tracks: Vec<Arc<TrackLocalStaticSample>>,
}

impl WebrtcEngine {
    /// Creates the peer connection, publishes local tracks and wires its
    /// callbacks into `event_tx`.
    pub async fn new(
        config: &TransportConfig,
        event_tx: mpsc::Sender<TransportEvent>,
    ) -> Result<Self> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()
            .context("Failed to register default codecs")?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: config
                .ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .context("Failed to create peer connection")?,
        );

        let local_tracks = add_local_tracks(&peer_connection, config.media).await?;

        let state_tx = event_tx.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();

                Box::pin(async move {
                    info!("Peer connection state changed: {:?}", s);
                    let state = match s {
                        RTCPeerConnectionState::Connecting => LinkState::Connecting,
                        RTCPeerConnectionState::Connected => LinkState::Connected,
                        RTCPeerConnectionState::Disconnected => LinkState::Disconnected,
                        RTCPeerConnectionState::Failed => LinkState::Failed,
                        RTCPeerConnectionState::Closed => LinkState::Closed,
                        _ => return,
                    };
                    let _ = tx.send(TransportEvent::LinkStateChanged(state)).await;
                })
            },
        ));

        let ice_tx = event_tx.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(json_candidate) = candidate.to_json() else {
                    return;
                };
                let Ok(str_candidate) = serde_json::to_string(&json_candidate) else {
                    return;
                };
                let _ = tx
                    .send(TransportEvent::LocalCandidate(IceCandidate(str_candidate)))
                    .await;
            })
        }));

        let track_tx = event_tx;
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let tx = track_tx.clone();

                Box::pin(async move {
                    let kind = match track.kind() {
                        RTPCodecType::Audio => MediaKind::Audio,
                        RTPCodecType::Video => MediaKind::Video,
                        _ => MediaKind::Unknown,
                    };
                    debug!("Remote track {} available ({:?})", track.id(), kind);
                    let stream = RemoteStream::new(track.id(), kind, track);
                    let _ = tx.send(TransportEvent::RemoteStreamAvailable(stream)).await;
                })
            },
        ));

        Ok(Self {
            peer_connection,
            local_tracks,
        })
    }

    /// Tracks a capture pipeline writes samples into.
    pub fn local_tracks(&self) -> &[Arc<TrackLocalStaticSample>] {
        &self.local_tracks
    }
}

async fn add_local_tracks(
    peer_connection: &RTCPeerConnection,
    media: MediaConfig,
) -> Result<Vec<Arc<TrackLocalStaticSample>>> {
    let mut wanted = Vec::new();
    if media.audio {
        wanted.push((MIME_TYPE_OPUS, "audio"));
    }
    if media.video {
        wanted.push((MIME_TYPE_VP8, "video"));
    }

    let mut tracks = Vec::with_capacity(wanted.len());
    for (mime_type, id) in wanted {
        let track = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: mime_type.to_owned(),
                ..Default::default()
            },
            id.to_owned(),
            LOCAL_STREAM_ID.to_owned(),
        ));
        peer_connection
            .add_track(Arc::clone(&track) as Arc<dyn TrackLocal + Send + Sync>)
            .await
            .with_context(|| format!("Failed to add local {id} track"))?;
        tracks.push(track);
    }
    Ok(tracks)
}

fn to_rtc(description: SessionDescription) -> Result<RTCSessionDescription> {
    let desc = match description.kind {
        SdpKind::Offer => RTCSessionDescription::offer(description.sdp)?,
        SdpKind::Answer => RTCSessionDescription::answer(description.sdp)?,
    };
    Ok(desc)
}

#[async_trait]
impl TransportEngine for WebrtcEngine {
    async fn create_offer(&self) -> Result<SessionDescription> {
        let offer = self.peer_connection.create_offer(None).await?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        let answer = self.peer_connection.create_answer(None).await?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn set_local_description(&self, description: SessionDescription) -> Result<()> {
        self.peer_connection
            .set_local_description(to_rtc(description)?)
            .await?;
        Ok(())
    }

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()> {
        self.peer_connection
            .set_remote_description(to_rtc(description)?)
            .await?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        let candidate: RTCIceCandidateInit = serde_json::from_str(candidate.as_str())
            .context("Failed to parse ICE candidate JSON")?;
        self.peer_connection.add_ice_candidate(candidate).await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.peer_connection.close().await?;
        Ok(())
    }
}
