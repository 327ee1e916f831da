//! Sequence version converters and the external-data merger
//!
//! Both supported paths target the v7 layout. The descriptor shrinks to
//! the v7 stride, every file-relative offset field is rewritten for the
//! moved data, and blend table entries that reference the `.rseq_ext`
//! companion are folded inline: the referenced companion bytes are
//! appended to the output tail and the entries repointed at them. A
//! missing companion is tolerated; external-only entries are simply
//! zeroed and everything else converts normally.

use log::{debug, info, warn};

use studio_mdl::anim::sequence_blend_count;
use studio_mdl::buffer::{RawAsset, put_i32};
use studio_mdl::context::ConvertContext;
use studio_mdl::layout::seqdesc::{SeqDescFields, SeqFlags};

use crate::error::{Result, RseqError};
use crate::layout::{
    EVENT_STRIDE_V7, EVENT_STRIDE_V10, RELOCATABLE_FIELDS, V7_STRIDE, V10_STRIDE, V71_STRIDE,
    field,
};
use crate::version::RseqVersion;

/// Convert a classified sequence buffer to the v7 target layout.
///
/// `ext` is the fully loaded `.rseq_ext` companion when one exists next
/// to the source file.
pub fn convert(
    ctx: &ConvertContext,
    seq: &RawAsset,
    ext: Option<&[u8]>,
    version: RseqVersion,
) -> Result<Vec<u8>> {
    match version {
        RseqVersion::V7_1 => convert_rseq71_to_7(ctx, seq, ext),
        RseqVersion::V10 => convert_rseq10_to_7(ctx, seq, ext),
        RseqVersion::V7 | RseqVersion::V11 => {
            Err(RseqError::UnsupportedVersion(version.label().to_string()))
        }
    }
}

/// Convert a v7.1 sequence to v7.
///
/// The descriptor drops its external-data pair; nothing else about the
/// record or the event stride changed, so the data tail shifts as one
/// piece.
pub fn convert_rseq71_to_7(
    ctx: &ConvertContext,
    seq: &RawAsset,
    ext: Option<&[u8]>,
) -> Result<Vec<u8>> {
    info!(target: ctx.target(), "converting rseq v7.1 to v7");

    require_len(seq, V71_STRIDE)?;
    let fields = SeqDescFields::read_at(seq, 0)?;
    if is_looping(&fields) {
        debug!(target: ctx.target(), "sequence is flagged looping");
    }
    let ext_decl = external_declaration(seq, V71_STRIDE)?;

    let delta = V7_STRIDE as i64 - V71_STRIDE as i64;

    let mut out = Vec::with_capacity(seq.len());
    out.extend_from_slice(seq.slice(0, V7_STRIDE)?);
    out.extend_from_slice(&seq.as_bytes()[V71_STRIDE..]);

    let ext_base = append_external(ctx, &mut out, ext, ext_decl)?;

    for f in RELOCATABLE_FIELDS {
        shift_field(&mut out, f, |v| v as i64 + delta)?;
    }

    resolve_blend_entries(&mut out, &fields, delta, ext_base, ext_decl)?;

    Ok(out)
}

/// Convert a v10 sequence to v7.
///
/// On top of the descriptor shrink, v10 event records carry a 16-byte
/// tail that v7 does not; the event table is rebuilt at the v7 stride and
/// every offset past it shifts by the collapsed amount as well.
pub fn convert_rseq10_to_7(
    ctx: &ConvertContext,
    seq: &RawAsset,
    ext: Option<&[u8]>,
) -> Result<Vec<u8>> {
    info!(target: ctx.target(), "converting rseq v10 to v7");

    require_len(seq, V10_STRIDE)?;
    let fields = SeqDescFields::read_at(seq, 0)?;
    let ext_decl = external_declaration(seq, V10_STRIDE)?;

    let num_events = usize::try_from(fields.num_events).unwrap_or(0);
    let delta_head = V7_STRIDE as i64 - V10_STRIDE as i64;

    let (ev_start, ev_end) = if num_events > 0 {
        let start = usize::try_from(fields.event_offset).map_err(|_| {
            RseqError::ConversionError(format!(
                "negative event table offset {}",
                fields.event_offset
            ))
        })?;
        if start < V10_STRIDE {
            return Err(RseqError::ConversionError(
                "event table overlaps the descriptor".to_string(),
            ));
        }
        (start, start + num_events * EVENT_STRIDE_V10)
    } else {
        (seq.len(), seq.len())
    };
    if ev_end > seq.len() {
        return Err(RseqError::ConversionError(format!(
            "event table runs past the end of the sequence ({ev_end} > {})",
            seq.len()
        )));
    }

    // every record loses the v10 extension tail
    let delta_tail = delta_head - (num_events * (EVENT_STRIDE_V10 - EVENT_STRIDE_V7)) as i64;

    let mut out = Vec::with_capacity(seq.len());
    out.extend_from_slice(seq.slice(0, V7_STRIDE)?);
    out.extend_from_slice(&seq.as_bytes()[V10_STRIDE..ev_start]);
    for i in 0..num_events {
        out.extend_from_slice(seq.slice(ev_start + i * EVENT_STRIDE_V10, EVENT_STRIDE_V7)?);
    }
    out.extend_from_slice(&seq.as_bytes()[ev_end..]);

    let ext_base = append_external(ctx, &mut out, ext, ext_decl)?;

    for f in RELOCATABLE_FIELDS {
        shift_field(&mut out, f, |v| {
            if (v as usize) >= ev_end {
                v as i64 + delta_tail
            } else {
                v as i64 + delta_head
            }
        })?;
    }

    resolve_blend_entries(&mut out, &fields, delta_tail, ext_base, ext_decl)?;

    Ok(out)
}

fn require_len(seq: &RawAsset, stride: usize) -> Result<()> {
    if seq.len() < stride {
        return Err(RseqError::ConversionError(format!(
            "sequence is {} bytes, shorter than its {stride}-byte descriptor",
            seq.len()
        )));
    }
    Ok(())
}

/// The companion slice a descriptor declares: `(offset, len)` within the
/// external file
fn external_declaration(seq: &RawAsset, stride: usize) -> Result<Option<(usize, usize)>> {
    let offset = seq.read_i32_at(field::EXTERNAL_DATA_OFFSET)?;
    let size = seq.read_i32_at(field::EXTERNAL_DATA_SIZE)?;
    debug_assert!(field::EXTERNAL_DATA_SIZE < stride);

    if size <= 0 {
        return Ok(None);
    }
    let offset = usize::try_from(offset)
        .map_err(|_| RseqError::ExternalData(format!("negative companion offset {offset}")))?;
    Ok(Some((offset, size as usize)))
}

/// Append the declared companion bytes to the output tail.
///
/// Returns the absolute offset the external data landed at, or `None`
/// when the sequence declares none or the companion file is absent.
fn append_external(
    ctx: &ConvertContext,
    out: &mut Vec<u8>,
    ext: Option<&[u8]>,
    decl: Option<(usize, usize)>,
) -> Result<Option<usize>> {
    let Some((offset, size)) = decl else {
        return Ok(None);
    };

    match ext {
        Some(buf) => {
            if offset + size > buf.len() {
                return Err(RseqError::ExternalData(format!(
                    "companion declares {size} bytes at {offset} but holds {}",
                    buf.len()
                )));
            }
            let base = out.len();
            out.extend_from_slice(&buf[offset..offset + size]);
            debug!(target: ctx.target(), "folded {size} companion bytes in at {base}");
            Ok(Some(base))
        }
        None => {
            warn!(
                target: ctx.target(),
                "sequence declares {size} external bytes but no companion file is present; \
                 external-only data will be omitted"
            );
            Ok(None)
        }
    }
}

/// Rewrite the blend animation offset table.
///
/// Inline entries shift with the data they point at; external entries
/// (negative, encoded as `-(companion_offset + 1)`) repoint at the
/// appended companion data, or become empty slots when it is absent.
fn resolve_blend_entries(
    out: &mut [u8],
    fields: &SeqDescFields,
    delta: i64,
    ext_base: Option<usize>,
    ext_decl: Option<(usize, usize)>,
) -> Result<()> {
    let blends = usize::try_from(sequence_blend_count(fields)).unwrap_or(0);
    if blends == 0 || fields.anim_index_offset <= 0 {
        return Ok(());
    }

    let table = (fields.anim_index_offset as i64 + delta) as usize;
    for i in 0..blends {
        let at = table + i * 4;
        let entry = read_i32(out, at)?;

        let resolved = if entry >= 0 {
            if entry == 0 { 0 } else { (i64::from(entry) + delta) as i32 }
        } else {
            let within = (-i64::from(entry) - 1) as usize;
            match (ext_base, ext_decl) {
                (Some(base), Some((_, size))) if within < size => (base + within) as i32,
                (Some(_), Some(_)) => {
                    return Err(RseqError::ExternalData(format!(
                        "blend entry {i} points {within} bytes into the companion data, \
                         past its declared size"
                    )));
                }
                // companion absent: the slot's data is external-only
                _ => 0,
            }
        };
        put_i32(out, at, resolved).map_err(RseqError::Buffer)?;
    }

    Ok(())
}

/// Shift one descriptor offset field through `adjust`, leaving empty
/// (zero or negative) fields untouched
fn shift_field(out: &mut [u8], at: usize, adjust: impl Fn(i32) -> i64) -> Result<()> {
    let v = read_i32(out, at)?;
    if v <= 0 {
        return Ok(());
    }
    let shifted = adjust(v);
    let shifted = i32::try_from(shifted).ok().filter(|&s| s > 0).ok_or_else(|| {
        RseqError::ConversionError(format!(
            "offset field at {at} relocated out of range ({v} -> {shifted})"
        ))
    })?;
    put_i32(out, at, shifted).map_err(RseqError::Buffer)
}

fn read_i32(buf: &[u8], at: usize) -> Result<i32> {
    let bytes: [u8; 4] = buf
        .get(at..at + 4)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| {
            RseqError::ConversionError(format!("blend table entry at {at} is out of bounds"))
        })?;
    Ok(i32::from_le_bytes(bytes))
}

/// Whether a sequence loops; used only for diagnostics
pub fn is_looping(fields: &SeqDescFields) -> bool {
    fields.flags.contains(SeqFlags::LOOPING)
}
