//! Z39.50-shaped test schemas
//!
//! Hand-written the way the PDU layer's generated codecs look: one generic
//! function per type, run unchanged by the encoder, decoder and printer.

#![allow(dead_code)]

use z3950_asn1::ber::{
    choice, constructed, explicit, implicit, member, required, sequence, sequence_of, Arm,
    BerTagClass, Choice, Coder, Direction,
};
use z3950_asn1::CodecResult;
use z3950_core::datatypes::{GeneralString, Oid, VisibleString};

const CONTEXT: BerTagClass = BerTagClass::ContextSpecific;

/// Bib-1 diagnostic set
pub const BIB1_DIAG: [u32; 6] = [1, 2, 840, 10003, 4, 1];

/// Close ::= [48] IMPLICIT SEQUENCE {
///     referenceId           [2] IMPLICIT OCTET STRING OPTIONAL,
///     closeReason           [211] IMPLICIT INTEGER,
///     diagnosticInformation [3] IMPLICIT InternationalString OPTIONAL,
///     resourceReportFormat  [4] IMPLICIT OBJECT IDENTIFIER OPTIONAL }
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Close<'a> {
    pub reference_id: Option<&'a [u8]>,
    pub close_reason: i64,
    pub diagnostic_information: Option<GeneralString<'a>>,
    pub resource_report_format: Option<Oid<'a>>,
}

pub fn close<'a, C: Coder<'a>>(
    c: &mut C,
    value: &mut Option<Close<'a>>,
    opt: bool,
    name: &str,
) -> CodecResult<bool> {
    constructed(c, value, BerTagClass::Application, 48, opt, name, |c, close| {
        implicit(c, CONTEXT, 2, &mut close.reference_id, true, "referenceId", C::octet_string)?;
        required(c, &mut close.close_reason, "closeReason", |c, v, opt, name| {
            implicit(c, CONTEXT, 211, v, opt, name, C::integer)
        })?;
        implicit(
            c,
            CONTEXT,
            3,
            &mut close.diagnostic_information,
            true,
            "diagnosticInformation",
            C::general_string,
        )?;
        implicit(
            c,
            CONTEXT,
            4,
            &mut close.resource_report_format,
            true,
            "resourceReportFormat",
            C::oid,
        )?;
        Ok(())
    })
}

/// addinfo CHOICE { v2Addinfo VisibleString, v3Addinfo InternationalString }
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Addinfo<'a> {
    V2(VisibleString<'a>),
    V3(GeneralString<'a>),
}

impl<'a> Choice<'a> for Addinfo<'a> {
    const ARMS: &'static [Arm] = &[Arm::untagged(0, "v2Addinfo"), Arm::untagged(1, "v3Addinfo")];

    fn which(&self) -> u32 {
        match self {
            Addinfo::V2(_) => 0,
            Addinfo::V3(_) => 1,
        }
    }

    fn code_arm<C: Coder<'a>>(
        c: &mut C,
        arm: &Arm,
        value: &mut Option<Self>,
        opt: bool,
    ) -> CodecResult<bool> {
        match arm.id {
            0 => member(
                c,
                value,
                opt,
                arm.name,
                |v| match v {
                    Addinfo::V2(s) => Some(*s),
                    _ => None,
                },
                Addinfo::V2,
                C::visible_string,
            ),
            _ => member(
                c,
                value,
                opt,
                arm.name,
                |v| match v {
                    Addinfo::V3(s) => Some(*s),
                    _ => None,
                },
                Addinfo::V3,
                C::general_string,
            ),
        }
    }
}

/// DefaultDiagFormat ::= SEQUENCE {
///     diagnosticSetId OBJECT IDENTIFIER,
///     condition       INTEGER,
///     addinfo         CHOICE { ... } }
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefaultDiagFormat<'a> {
    pub diagnostic_set_id: Oid<'a>,
    pub condition: i64,
    pub addinfo: Option<Addinfo<'a>>,
}

pub fn default_diag_format<'a, C: Coder<'a>>(
    c: &mut C,
    value: &mut Option<DefaultDiagFormat<'a>>,
    opt: bool,
    name: &str,
) -> CodecResult<bool> {
    sequence(c, value, opt, name, |c, diag| {
        required(c, &mut diag.diagnostic_set_id, "diagnosticSetId", C::oid)?;
        required(c, &mut diag.condition, "condition", C::integer)?;
        choice(c, &mut diag.addinfo, false, "addinfo")?;
        Ok(())
    })
}

/// SEQUENCE OF DefaultDiagFormat
pub fn diag_list<'a, C: Coder<'a>>(
    c: &mut C,
    value: &mut Option<&'a [DefaultDiagFormat<'a>]>,
    opt: bool,
    name: &str,
) -> CodecResult<bool> {
    sequence_of(c, value, opt, name, default_diag_format)
}

/// Operator ::= [46] CHOICE { and [0] IMPLICIT NULL, or [1] IMPLICIT NULL,
///     and-not [2] IMPLICIT NULL }
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Operator {
    #[default]
    And,
    Or,
    AndNot,
}

impl<'a> Choice<'a> for Operator {
    const ARMS: &'static [Arm] = &[
        Arm::implicit(CONTEXT, 0, 0, "and"),
        Arm::implicit(CONTEXT, 1, 1, "or"),
        Arm::implicit(CONTEXT, 2, 2, "and-not"),
    ];

    fn which(&self) -> u32 {
        match self {
            Operator::And => 0,
            Operator::Or => 1,
            Operator::AndNot => 2,
        }
    }

    fn code_arm<C: Coder<'a>>(
        c: &mut C,
        arm: &Arm,
        value: &mut Option<Self>,
        opt: bool,
    ) -> CodecResult<bool> {
        let operator = match arm.id {
            0 => Operator::And,
            1 => Operator::Or,
            _ => Operator::AndNot,
        };
        member(c, value, opt, arm.name, |_| Some(()), move |()| operator, C::null)
    }
}

/// RPNStructure ::= CHOICE {
///     op       [0] Operand,
///     rpnRpnOp [1] IMPLICIT SEQUENCE { rpn1 RPNStructure, rpn2 RPNStructure, op Operator } }
///
/// Operand is reduced to a `[45] IMPLICIT OCTET STRING` term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RpnStructure<'a> {
    Term(&'a [u8]),
    Op(&'a RpnOp<'a>),
}

impl Default for RpnStructure<'_> {
    fn default() -> Self {
        RpnStructure::Term(&[])
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RpnOp<'a> {
    pub rpn1: RpnStructure<'a>,
    pub rpn2: RpnStructure<'a>,
    pub op: Operator,
}

impl<'a> Choice<'a> for RpnStructure<'a> {
    const ARMS: &'static [Arm] = &[
        Arm::explicit(CONTEXT, 0, 0, "op"),
        Arm::implicit(CONTEXT, 1, 1, "rpnRpnOp"),
    ];

    fn which(&self) -> u32 {
        match self {
            RpnStructure::Term(_) => 0,
            RpnStructure::Op(_) => 1,
        }
    }

    fn code_arm<C: Coder<'a>>(
        c: &mut C,
        arm: &Arm,
        value: &mut Option<Self>,
        opt: bool,
    ) -> CodecResult<bool> {
        match arm.id {
            0 => member(
                c,
                value,
                opt,
                arm.name,
                |v| match v {
                    RpnStructure::Term(t) => Some(*t),
                    _ => None,
                },
                RpnStructure::Term,
                |c, v, opt, name| implicit(c, CONTEXT, 45, v, opt, name, C::octet_string),
            ),
            _ => member(
                c,
                value,
                opt,
                arm.name,
                |v| match v {
                    RpnStructure::Op(op) => Some(*op),
                    _ => None,
                },
                RpnStructure::Op,
                rpn_op,
            ),
        }
    }
}

pub fn rpn_structure<'a, C: Coder<'a>>(
    c: &mut C,
    value: &mut Option<RpnStructure<'a>>,
    opt: bool,
    name: &str,
) -> CodecResult<bool> {
    choice(c, value, opt, name)
}

/// Decoded operator nodes live in the arena
fn rpn_op<'a, C: Coder<'a>>(
    c: &mut C,
    value: &mut Option<&'a RpnOp<'a>>,
    opt: bool,
    name: &str,
) -> CodecResult<bool> {
    let mut node = value.copied();
    let present = sequence(c, &mut node, opt, name, |c, op| {
        required(c, &mut op.rpn1, "rpn1", rpn_structure)?;
        required(c, &mut op.rpn2, "rpn2", rpn_structure)?;
        required(c, &mut op.op, "op", |c, v, opt, name| {
            explicit(c, CONTEXT, 46, v, opt, name, choice)
        })?;
        Ok(())
    })?;
    if present && c.direction() == Direction::Decode {
        if let (Some(arena), Some(node)) = (c.arena(), node) {
            *value = Some(&*arena.alloc(node));
        }
    }
    Ok(present)
}

/// Build `depth` nested AND nodes over single-letter terms, in an arena
pub fn balanced_query<'a>(arena: &'a z3950_asn1::Arena, depth: usize) -> RpnStructure<'a> {
    if depth == 0 {
        return RpnStructure::Term(b"x");
    }
    let node = RpnOp {
        rpn1: balanced_query(arena, depth - 1),
        rpn2: RpnStructure::Term(b"y"),
        op: if depth % 2 == 0 {
            Operator::And
        } else {
            Operator::Or
        },
    };
    RpnStructure::Op(arena.alloc(node))
}
