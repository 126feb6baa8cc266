// ABOUTME: Fallback decoder chain turning captured gate frames into candidate token strings
// ABOUTME: Ordered capability probing; everything produced here is untrusted until fully verified
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Frame Decode Pipeline
//!
//! The optical front end (camera loop, QR decode) feeds this chain raw frame
//! payloads. Decoders are probed in order until one yields text; the chain's
//! output is only ever a *candidate* string that still has to pass full
//! token verification, so the entire pipeline sits outside the trust
//! boundary.

use base64::{engine::general_purpose, Engine};

/// One decoding capability in the chain
pub trait FrameDecoder: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Try to extract a token string from a frame payload
    fn decode(&self, frame: &[u8]) -> Option<String>;
}

/// Scanner SDKs that already decoded the QR code hand over the payload as
/// plain UTF-8 text
pub struct Utf8TextDecoder;

impl FrameDecoder for Utf8TextDecoder {
    fn name(&self) -> &'static str {
        "utf8-text"
    }

    fn decode(&self, frame: &[u8]) -> Option<String> {
        let text = std::str::from_utf8(frame).ok()?.trim();
        if text.is_empty() {
            return None;
        }
        Some(text.to_owned())
    }
}

/// Some camera bridges wrap the decoded payload in base64 before handing it
/// to the gate process
pub struct Base64PayloadDecoder;

impl FrameDecoder for Base64PayloadDecoder {
    fn name(&self) -> &'static str {
        "base64-payload"
    }

    fn decode(&self, frame: &[u8]) -> Option<String> {
        let raw = general_purpose::STANDARD.decode(frame).ok()?;
        let text = String::from_utf8(raw).ok()?;
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        Some(text.to_owned())
    }
}

/// Ordered chain of decoders, probed until one succeeds
pub struct DecoderChain {
    decoders: Vec<Box<dyn FrameDecoder>>,
}

impl DecoderChain {
    /// Build a chain from an ordered decoder list
    #[must_use]
    pub fn new(decoders: Vec<Box<dyn FrameDecoder>>) -> Self {
        Self { decoders }
    }

    /// The default chain used by gate deployments
    #[must_use]
    pub fn default_chain() -> Self {
        Self::new(vec![Box::new(Base64PayloadDecoder), Box::new(Utf8TextDecoder)])
    }

    /// Run the chain over a frame, returning the first decoder's text
    #[must_use]
    pub fn decode(&self, frame: &[u8]) -> Option<String> {
        for decoder in &self.decoders {
            if let Some(text) = decoder.decode(frame) {
                tracing::debug!(decoder = decoder.name(), "Frame decoded to candidate token");
                return Some(text);
            }
        }
        None
    }
}
