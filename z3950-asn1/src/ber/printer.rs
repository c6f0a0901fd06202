//! Text printer driven by the same schema code as the encoder
//!
//! Output is one line per element, indented two spaces per open value:
//!
//! ```text
//! close {
//!   referenceId: 'r1'
//!   closeReason: 4
//! }
//! ```
//!
//! Explicit tag wrappers are transparent; the printer shows the member
//! under its own name.

use super::arena::Arena;
use super::coder::{Coder, Direction};
use super::frame::Frame;
use super::primitive::Primitive;
use super::state::CoderState;
use super::types::{BerLength, BerTag, BerTagClass};
use std::fmt::Write;
use z3950_core::config::CodecConfig;
use z3950_core::error::{CodecError, CodecFailure, CodecResult};

#[derive(Debug)]
pub struct BerPrinter {
    state: CoderState,
    out: String,
}

impl BerPrinter {
    pub fn new() -> Self {
        Self::with_config(CodecConfig::default())
    }

    /// Create a printer with `config`
    ///
    /// An invalid configuration is latched as the first failure.
    pub fn with_config(config: CodecConfig) -> Self {
        let validated = config.validate();
        let mut state = CoderState::new(config);
        if let Err(e) = validated {
            state.fail(e, "", 0);
        }
        Self {
            state,
            out: String::new(),
        }
    }

    /// Text printed so far
    pub fn output(&self) -> &str {
        &self.out
    }

    /// Take the printed text, or the latched failure
    pub fn finish(&mut self) -> Result<String, CodecFailure> {
        if let Some(failure) = self.state.failure() {
            return Err(failure.clone());
        }
        Ok(std::mem::take(&mut self.out))
    }

    pub fn reset(&mut self) {
        self.state.reset();
        self.out.clear();
    }

    fn start_line(&mut self, name: &str) {
        for _ in 0..self.state.frames().depth() {
            self.out.push_str("  ");
        }
        self.out.push_str(if name.is_empty() { "-" } else { name });
    }
}

impl Default for BerPrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Coder<'a> for BerPrinter {
    fn direction(&self) -> Direction {
        Direction::Print
    }

    fn state(&self) -> &CoderState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CoderState {
        &mut self.state
    }

    fn offset(&self) -> usize {
        self.out.len()
    }

    fn arena(&self) -> Option<&'a Arena> {
        None
    }

    fn primitive<P: Primitive<'a>>(
        &mut self,
        value: &mut Option<P>,
        opt: bool,
        name: &str,
    ) -> CodecResult<bool> {
        self.state.check()?;
        self.state.clear_tag_override();
        let Some(v) = value.as_ref() else {
            return self.missing(opt, name);
        };
        self.start_line(name);
        self.out.push_str(": ");
        if v.print(&mut self.out).is_err() {
            let error = CodecError::InvalidValue(format!("{} cannot be printed", P::TYPE_NAME));
            return Err(self.fail(error, name));
        }
        self.out.push('\n');
        Ok(true)
    }

    fn any(&mut self, value: &mut Option<&'a [u8]>, opt: bool, name: &str) -> CodecResult<bool> {
        self.state.check()?;
        if self.state.has_tag_override() {
            self.state.clear_tag_override();
            let error = CodecError::InvalidValue(format!(
                "ANY `{}` cannot be implicitly tagged",
                name
            ));
            return Err(self.fail(error, name));
        }
        let Some(raw) = *value else {
            return self.missing(opt, name);
        };
        self.start_line(name);
        let _ = write!(self.out, ": ANY ({} bytes) ", raw.len());
        for byte in raw {
            let _ = write!(self.out, "{:02X}", byte);
        }
        self.out.push('\n');
        Ok(true)
    }

    fn constructed_begin(
        &mut self,
        present: bool,
        class: BerTagClass,
        number: u32,
        opt: bool,
        name: &str,
    ) -> CodecResult<bool> {
        self.state.check()?;
        let (class, number) = self.state.resolve_tag(class, number);
        self.state.take_length_width();
        if !present {
            return self.missing(opt, name);
        }
        self.start_line(name);
        if class == BerTagClass::Universal {
            self.out.push_str(" {\n");
        } else {
            let _ = writeln!(self.out, " [{} {}] {{", class.label(), number);
        }
        let frame = Frame {
            base_offset: self.out.len(),
            length_field_offset: 0,
            declared_length: BerLength::Indefinite,
            reserved_width: 0,
            name: name.to_string(),
        };
        match self.state.frames_mut().push(frame) {
            Ok(()) => Ok(true),
            Err(e) => Err(self.fail(e, name)),
        }
    }

    fn constructed_more(&mut self) -> CodecResult<bool> {
        self.state.check()?;
        Ok(false)
    }

    fn constructed_end(&mut self) -> CodecResult<()> {
        self.state.check()?;
        if let Err(e) = self.state.frames_mut().pop() {
            return Err(self.fail(e, ""));
        }
        for _ in 0..self.state.frames().depth() {
            self.out.push_str("  ");
        }
        self.out.push_str("}\n");
        Ok(())
    }

    fn peek_tag(&mut self) -> CodecResult<Option<BerTag>> {
        self.state.check()?;
        Ok(None)
    }
}
