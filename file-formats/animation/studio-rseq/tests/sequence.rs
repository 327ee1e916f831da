//! End-to-end sequence conversion tests over synthetic buffers

use pretty_assertions::assert_eq;
use studio_mdl::buffer::{RawAsset, put_i32, put_u32};
use studio_mdl::context::ConvertContext;
use studio_rseq::layout::{
    EVENT_STRIDE_V7, EVENT_STRIDE_V10, V7_STRIDE, V10_STRIDE, V71_STRIDE, field,
};
use studio_rseq::{RseqError, RseqVersion};

/// A v7.1 sequence: one event, a 2x1 blend grid with one inline and one
/// external entry, a label string, and 8 bytes of inline animation data.
fn v71_fixture() -> RawAsset {
    let events = V71_STRIDE;
    let blends = events + EVENT_STRIDE_V7;
    let label = blends + 8;
    let anim_data = label + 4;
    let total = anim_data + 8;

    let mut raw = vec![0u8; total];
    put_i32(&mut raw, field::LABEL_OFFSET, label as i32).unwrap();
    put_u32(&mut raw, field::FLAGS, 0x0001).unwrap();
    put_i32(&mut raw, field::NUM_EVENTS, 1).unwrap();
    put_i32(&mut raw, field::EVENT_OFFSET, events as i32).unwrap();
    put_i32(&mut raw, field::NUM_BLENDS, 2).unwrap();
    put_i32(&mut raw, field::ANIM_INDEX_OFFSET, blends as i32).unwrap();
    put_i32(&mut raw, field::GROUP_SIZE_0, 2).unwrap();
    put_i32(&mut raw, field::GROUP_SIZE_1, 1).unwrap();
    // the sequence expects 6 bytes of companion data starting at 2
    put_i32(&mut raw, field::EXTERNAL_DATA_OFFSET, 2).unwrap();
    put_i32(&mut raw, field::EXTERNAL_DATA_SIZE, 6).unwrap();

    raw[events] = 0xE7; // event marker
    put_i32(&mut raw, blends, anim_data as i32).unwrap(); // inline entry
    put_i32(&mut raw, blends + 4, -5).unwrap(); // companion offset 4
    raw[label..label + 4].copy_from_slice(b"run\0");
    raw[anim_data] = 0xAD;

    RawAsset::new(raw)
}

#[test]
fn converts_v71_with_companion_present() {
    let ctx = ConvertContext::new();
    let seq = v71_fixture();
    let companion: Vec<u8> = (0u8..10).collect();

    let out = studio_rseq::convert(&ctx, &seq, Some(&companion), RseqVersion::V7_1).unwrap();

    let inline_len = seq.len() - (V71_STRIDE - V7_STRIDE);
    // declared 6 companion bytes folded in at the tail
    assert_eq!(out.len(), inline_len + 6);
    assert_eq!(&out[inline_len..], &companion[2..8]);

    let buf = RawAsset::new(out);
    let events = buf.read_i32_at(field::EVENT_OFFSET).unwrap() as usize;
    assert_eq!(events, V7_STRIDE);
    assert_eq!(buf.as_bytes()[events], 0xE7);

    let label = buf.read_i32_at(field::LABEL_OFFSET).unwrap() as usize;
    assert_eq!(buf.slice(label, 4).unwrap(), b"run\0");

    let blends = buf.read_i32_at(field::ANIM_INDEX_OFFSET).unwrap() as usize;
    let inline_entry = buf.read_i32_at(blends).unwrap() as usize;
    assert_eq!(buf.as_bytes()[inline_entry], 0xAD);
    // the external entry now points 4 bytes into the folded companion data
    let external_entry = buf.read_i32_at(blends + 4).unwrap() as usize;
    assert_eq!(external_entry, inline_len + 4);
    assert_eq!(buf.as_bytes()[external_entry], companion[2 + 4]);
}

#[test]
fn converts_v71_with_companion_absent() {
    let ctx = ConvertContext::new();
    let seq = v71_fixture();

    // scenario: no .rseq_ext next to the input; conversion must still
    // succeed with external-only entries emptied
    let out = studio_rseq::convert(&ctx, &seq, None, RseqVersion::V7_1).unwrap();
    assert_eq!(out.len(), seq.len() - (V71_STRIDE - V7_STRIDE));

    let buf = RawAsset::new(out);
    let blends = buf.read_i32_at(field::ANIM_INDEX_OFFSET).unwrap() as usize;
    // inline entry survives, external entry is an empty slot
    assert!(buf.read_i32_at(blends).unwrap() > 0);
    assert_eq!(buf.read_i32_at(blends + 4).unwrap(), 0);
}

/// A v10 sequence: one 96-byte event, a 2x1 blend grid, label, and inline
/// animation data.
fn v10_fixture() -> RawAsset {
    let events = V10_STRIDE;
    let blends = events + EVENT_STRIDE_V10;
    let label = blends + 8;
    let anim_data = label + 4;
    let total = anim_data + 8;

    let mut raw = vec![0u8; total];
    put_i32(&mut raw, field::LABEL_OFFSET, label as i32).unwrap();
    put_i32(&mut raw, field::NUM_EVENTS, 1).unwrap();
    put_i32(&mut raw, field::EVENT_OFFSET, events as i32).unwrap();
    put_i32(&mut raw, field::NUM_BLENDS, 2).unwrap();
    put_i32(&mut raw, field::ANIM_INDEX_OFFSET, blends as i32).unwrap();
    put_i32(&mut raw, field::GROUP_SIZE_0, 2).unwrap();
    put_i32(&mut raw, field::GROUP_SIZE_1, 1).unwrap();
    put_i32(&mut raw, field::EXTERNAL_DATA_OFFSET, 0).unwrap();
    put_i32(&mut raw, field::EXTERNAL_DATA_SIZE, 6).unwrap();

    raw[events] = 0xE7; // survives the stride cut
    raw[events + EVENT_STRIDE_V7] = 0x99; // v10 extension tail, dropped
    put_i32(&mut raw, blends, anim_data as i32).unwrap();
    put_i32(&mut raw, blends + 4, -1i32).unwrap(); // companion offset 0
    raw[label..label + 4].copy_from_slice(b"jog\0");
    raw[anim_data] = 0xAD;

    RawAsset::new(raw)
}

#[test]
fn converts_v10_rebuilding_events() {
    let ctx = ConvertContext::new();
    let seq = v10_fixture();
    let companion = [0xC0u8, 0xC1, 0xC2, 0xC3, 0xC4, 0xC5];

    let out = studio_rseq::convert(&ctx, &seq, Some(&companion), RseqVersion::V10).unwrap();

    // descriptor shrink plus one collapsed event record, plus companion
    let inline_len = seq.len() - (V10_STRIDE - V7_STRIDE) - (EVENT_STRIDE_V10 - EVENT_STRIDE_V7);
    assert_eq!(out.len(), inline_len + 6);

    let buf = RawAsset::new(out);
    let events = buf.read_i32_at(field::EVENT_OFFSET).unwrap() as usize;
    assert_eq!(events, V7_STRIDE);
    assert_eq!(buf.as_bytes()[events], 0xE7);
    // the v10 extension tail did not follow the record
    assert_ne!(buf.as_bytes()[events + EVENT_STRIDE_V7 - 1], 0x99);

    let label = buf.read_i32_at(field::LABEL_OFFSET).unwrap() as usize;
    assert_eq!(buf.slice(label, 4).unwrap(), b"jog\0");

    let blends = buf.read_i32_at(field::ANIM_INDEX_OFFSET).unwrap() as usize;
    let inline_entry = buf.read_i32_at(blends).unwrap() as usize;
    assert_eq!(buf.as_bytes()[inline_entry], 0xAD);
    let external_entry = buf.read_i32_at(blends + 4).unwrap() as usize;
    assert_eq!(buf.as_bytes()[external_entry], 0xC0);
}

#[test]
fn rejects_versions_without_converters() {
    let ctx = ConvertContext::new();
    let seq = v71_fixture();

    for version in [RseqVersion::V7, RseqVersion::V11] {
        let err = studio_rseq::convert(&ctx, &seq, None, version).unwrap_err();
        assert!(matches!(err, RseqError::UnsupportedVersion(_)), "{version}");
    }
}

#[test]
fn rejects_undersized_companion() {
    let ctx = ConvertContext::new();
    let seq = v71_fixture();
    // declares offset 2 + size 6, so 5 bytes cannot satisfy it
    let companion = [0u8; 5];

    let err = studio_rseq::convert(&ctx, &seq, Some(&companion), RseqVersion::V7_1).unwrap_err();
    assert!(matches!(err, RseqError::ExternalData(_)));
}

#[test]
fn rejects_event_table_past_eof() {
    let ctx = ConvertContext::new();
    let mut raw = vec![0u8; V10_STRIDE + 16];
    put_i32(&mut raw, field::NUM_EVENTS, 4).unwrap();
    put_i32(&mut raw, field::EVENT_OFFSET, V10_STRIDE as i32).unwrap();

    let err = studio_rseq::convert(&ctx, &RawAsset::new(raw), None, RseqVersion::V10).unwrap_err();
    assert!(matches!(err, RseqError::ConversionError(_)));
}
