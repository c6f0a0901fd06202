//! Coder state shared by the three directions
//!
//! Everything in the Coder Context that does not depend on the direction:
//! the sticky error latch, the frame stack, the one-shot tag override,
//! length-width override and choice bias, and the charset converter.

use super::frame::FrameStack;
use super::types::BerTagClass;
use std::sync::Arc;
use z3950_core::charset::CharsetConverter;
use z3950_core::config::CodecConfig;
use z3950_core::error::{CodecError, CodecFailure, CodecResult};

/// Shared charset converter handle
pub type SharedConverter = Arc<dyn CharsetConverter + Send + Sync>;

/// Direction-independent coder state
pub struct CoderState {
    config: CodecConfig,
    frames: FrameStack,
    failure: Option<CodecFailure>,
    tag_override: Option<(BerTagClass, u32)>,
    length_width: Option<u8>,
    choice_bias: Option<u32>,
    charset: Option<SharedConverter>,
}

impl CoderState {
    pub fn new(config: CodecConfig) -> Self {
        let frames = FrameStack::new(config.max_depth);
        Self {
            config,
            frames,
            failure: None,
            tag_override: None,
            length_width: None,
            choice_bias: None,
            charset: None,
        }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn frames(&self) -> &FrameStack {
        &self.frames
    }

    pub fn frames_mut(&mut self) -> &mut FrameStack {
        &mut self.frames
    }

    /// The latched failure, if any
    pub fn failure(&self) -> Option<&CodecFailure> {
        self.failure.as_ref()
    }

    /// Entry check of every combinator: fail fast once an error is latched
    pub fn check(&self) -> CodecResult<()> {
        match &self.failure {
            Some(failure) => Err(failure.error.clone()),
            None => Ok(()),
        }
    }

    /// Latch `error` for element `name` and hand it back for propagation
    ///
    /// Only the first failure is kept; later ones are returned unchanged
    /// but not recorded.
    pub fn fail(&mut self, error: CodecError, name: &str, offset: usize) -> CodecError {
        if self.failure.is_none() {
            let element_path = self.frames.path(name);
            log::debug!(
                "codec {} at `{}` (offset {}): {}",
                error.kind(),
                element_path,
                offset,
                error
            );
            self.failure = Some(CodecFailure {
                error: error.clone(),
                element_path,
                offset,
            });
        }
        error
    }

    /// Optionality policy for an element whose presence check failed
    ///
    /// Returns `Ok(false)` for an optional element, otherwise latches
    /// `RequiredFieldMissing` tagged with the element's name.
    pub fn missing(&mut self, opt: bool, name: &str, offset: usize) -> CodecResult<bool> {
        if opt {
            return Ok(false);
        }
        Err(self.fail(
            CodecError::RequiredFieldMissing(name.to_string()),
            name,
            offset,
        ))
    }

    /// Make the next primitive or constructed call use `class`/`number`
    /// instead of its own tag
    pub fn set_tag_override(&mut self, class: BerTagClass, number: u32) {
        self.tag_override = Some((class, number));
    }

    /// Drop a pending override that no call consumed
    pub fn clear_tag_override(&mut self) {
        self.tag_override = None;
    }

    pub fn has_tag_override(&self) -> bool {
        self.tag_override.is_some()
    }

    /// Take the pending override, falling back to the type's own tag
    pub fn resolve_tag(&mut self, class: BerTagClass, number: u32) -> (BerTagClass, u32) {
        self.tag_override.take().unwrap_or((class, number))
    }

    /// Reserve `width` length octets for the next constructed value only
    pub fn set_length_width(&mut self, width: u8) {
        self.length_width = Some(width);
    }

    /// Width for the constructed value being opened now
    pub fn take_length_width(&mut self) -> u8 {
        self.length_width.take().unwrap_or(self.config.length_width)
    }

    /// Restrict the next untagged choice to the arm with discriminant `id`
    pub fn set_choice_bias(&mut self, id: u32) {
        self.choice_bias = Some(id);
    }

    pub fn take_choice_bias(&mut self) -> Option<u32> {
        self.choice_bias.take()
    }

    pub fn set_charset(&mut self, converter: Option<SharedConverter>) {
        self.charset = converter;
    }

    pub fn charset(&self) -> Option<&(dyn CharsetConverter + Send + Sync)> {
        self.charset.as_deref()
    }

    /// Clear the error latch, frames and one-shot settings for the next message
    ///
    /// The configuration and the charset converter survive.
    pub fn reset(&mut self) {
        self.frames.clear();
        self.failure = None;
        self.tag_override = None;
        self.length_width = None;
        self.choice_bias = None;
    }
}

impl std::fmt::Debug for CoderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoderState")
            .field("config", &self.config)
            .field("depth", &self.frames.depth())
            .field("failure", &self.failure)
            .field("tag_override", &self.tag_override)
            .field("charset", &self.charset.as_ref().map(|c| c.name().to_string()))
            .finish()
    }
}
