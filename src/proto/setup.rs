//! Connection setup decoding: the client's initiation and the server's
//! refusal / acceptance / authentication-request responses.
//!
//! The initiation header is written in the client's byte order, announced
//! by its own first octet. The acceptance carries a recursive tree:
//! SCREENs holding DEPTHs holding VISUALTYPEs.

use super::endianness::{ByteOrder, Cursor};
use super::fmt::{self, FieldList, FmtOptions};
use super::{align, enums, ParseError};

/// Fixed initiation header size.
const INITIATION_HEADER: usize = 12;
/// Fixed response prelude size (status byte through length field).
const RESPONSE_HEADER: usize = 8;

/// Decoded client initiation.
pub struct Initiation {
    pub byte_order: ByteOrder,
    pub size: usize,
    pub fields: FieldList,
}

/// Computes the framed size of an initiation, or `None` when fewer than 12
/// bytes have arrived.
pub fn framed_initiation_size(buf: &[u8]) -> Result<Option<usize>, ParseError> {
    if buf.len() < INITIATION_HEADER {
        return Ok(None);
    }
    let order =
        ByteOrder::from_octet(buf[0]).ok_or(ParseError::InvalidByteOrder(buf[0]))?;
    let mut c = Cursor::new(&buf[..INITIATION_HEADER], order);
    c.skip(6)?;
    let name_len = c.u16()? as usize;
    let data_len = c.u16()? as usize;
    Ok(Some(
        INITIATION_HEADER + align::pad(name_len) + align::pad(data_len),
    ))
}

/// Parses one complete initiation frame.
pub fn parse_initiation(buf: &[u8]) -> Result<Initiation, ParseError> {
    let order =
        ByteOrder::from_octet(buf[0]).ok_or(ParseError::InvalidByteOrder(buf[0]))?;
    let mut c = Cursor::new(buf, order);
    c.skip(2)?; // byte-order octet, unused
    let major = c.u16()?;
    let minor = c.u16()?;
    let name_len = c.u16()? as usize;
    let data_len = c.u16()? as usize;
    c.skip(2)?;
    let auth_name = c.padded_bytes(name_len)?;
    c.padded_bytes(data_len)?;

    let mut fields = FieldList::new();
    fields.push("byte-order", order.name());
    fields.push("protocol-major-version", major.to_string());
    fields.push("protocol-minor-version", minor.to_string());
    fields.push_verbose("authorization-protocol-name-length", name_len.to_string());
    fields.push_verbose("authorization-protocol-data-length", data_len.to_string());
    fields.push("authorization-protocol-name", fmt::quote_string8(auth_name));
    fields.push("authorization-protocol-data", fmt::fmt_opaque(data_len));

    Ok(Initiation {
        byte_order: order,
        size: c.offset(),
        fields,
    })
}

/// First byte of a setup response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStatus {
    Failed,
    Success,
    Authenticate,
}

/// Decoded server response to an initiation.
pub struct SetupResponse {
    pub status: SetupStatus,
    pub title: &'static str,
    pub fields: FieldList,
}

/// Computes the framed size of a setup response, or `None` when fewer than
/// 8 bytes have arrived. Every variant carries its additional length in
/// 4-byte units at offset 6.
pub fn framed_response_size(buf: &[u8], order: ByteOrder) -> Result<Option<usize>, ParseError> {
    if buf.len() < RESPONSE_HEADER {
        return Ok(None);
    }
    if buf[0] > 2 {
        return Err(ParseError::InvalidSetupStatus(buf[0]));
    }
    let mut c = Cursor::new(&buf[..RESPONSE_HEADER], order);
    c.skip(6)?;
    let units = c.u16()? as usize;
    Ok(Some(RESPONSE_HEADER + align::unit_bytes(units)))
}

/// Parses one complete setup response frame.
pub fn parse_response(
    buf: &[u8],
    order: ByteOrder,
    opts: &FmtOptions,
) -> Result<SetupResponse, ParseError> {
    let mut c = Cursor::new(buf, order);
    let status = c.u8()?;
    match status {
        0 => parse_refusal(&mut c),
        1 => parse_acceptance(&mut c, opts),
        2 => parse_authenticate(&mut c),
        other => Err(ParseError::InvalidSetupStatus(other)),
    }
}

fn parse_refusal(c: &mut Cursor<'_>) -> Result<SetupResponse, ParseError> {
    let reason_len = c.u8()? as usize;
    let major = c.u16()?;
    let minor = c.u16()?;
    let units = c.u16()? as usize;
    let reason_area = c.bytes(align::unit_bytes(units))?;
    let reason = reason_area.get(..reason_len).unwrap_or(reason_area);

    let mut fields = FieldList::new();
    fields.push_verbose("reason-length", reason_len.to_string());
    fields.push("protocol-major-version", major.to_string());
    fields.push("protocol-minor-version", minor.to_string());
    fields.push("reason", fmt::quote_string8(reason));

    Ok(SetupResponse {
        status: SetupStatus::Failed,
        title: "server refused connection",
        fields,
    })
}

fn parse_authenticate(c: &mut Cursor<'_>) -> Result<SetupResponse, ParseError> {
    c.skip(5)?;
    let units = c.u16()? as usize;
    let reason_area = c.bytes(align::unit_bytes(units))?;
    let trimmed_len = reason_area
        .iter()
        .rposition(|&b| b != 0)
        .map_or(0, |i| i + 1);

    let mut fields = FieldList::new();
    fields.push("reason", fmt::quote_string8(&reason_area[..trimmed_len]));

    Ok(SetupResponse {
        status: SetupStatus::Authenticate,
        title: "server requested further authentication",
        fields,
    })
}

fn parse_acceptance(
    c: &mut Cursor<'_>,
    opts: &FmtOptions,
) -> Result<SetupResponse, ParseError> {
    c.skip(1)?;
    let major = c.u16()?;
    let minor = c.u16()?;
    let _additional_units = c.u16()? as usize;
    let release = c.u32()?;
    let id_base = c.u32()?;
    let id_mask = c.u32()?;
    let motion_buffer = c.u32()?;
    let vendor_len = c.u16()? as usize;
    let max_request_len = c.u16()?;
    let roots_count = c.u8()? as usize;
    let formats_count = c.u8()? as usize;
    let image_byte_order = c.u8()?;
    let bitmap_bit_order = c.u8()?;
    let scanline_unit = c.u8()?;
    let scanline_pad = c.u8()?;
    let min_keycode = c.u8()?;
    let max_keycode = c.u8()?;
    c.skip(4)?;
    let vendor = c.padded_bytes(vendor_len)?;

    let mut formats = Vec::with_capacity(formats_count);
    for _ in 0..formats_count {
        formats.push(parse_format(c, opts)?);
    }
    let mut roots = Vec::with_capacity(roots_count);
    for _ in 0..roots_count {
        roots.push(parse_screen(c, opts)?);
    }

    let mut fields = FieldList::new();
    fields.push("protocol-major-version", major.to_string());
    fields.push("protocol-minor-version", minor.to_string());
    fields.push("release-number", release.to_string());
    fields.push("resource-id-base", fmt::fmt_hex32(id_base));
    fields.push("resource-id-mask", fmt::fmt_hex32(id_mask));
    fields.push("motion-buffer-size", motion_buffer.to_string());
    fields.push("maximum-request-length", max_request_len.to_string());
    fields.push(
        "image-byte-order",
        fmt::fmt_enum(u32::from(image_byte_order), enums::IMAGE_BYTE_ORDER),
    );
    fields.push(
        "bitmap-format-bit-order",
        fmt::fmt_enum(u32::from(bitmap_bit_order), enums::BITMAP_BIT_ORDER),
    );
    fields.push("bitmap-format-scanline-unit", scanline_unit.to_string());
    fields.push("bitmap-format-scanline-pad", scanline_pad.to_string());
    fields.push("min-keycode", min_keycode.to_string());
    fields.push("max-keycode", max_keycode.to_string());
    fields.push("vendor", fmt::quote_string8(vendor));
    fields.push("pixmap-formats", fmt::fmt_list(&formats, opts, 1, true));
    fields.push("roots", fmt::fmt_list(&roots, opts, 1, false));

    Ok(SetupResponse {
        status: SetupStatus::Success,
        title: "server accepted connection",
        fields,
    })
}

fn parse_format(c: &mut Cursor<'_>, opts: &FmtOptions) -> Result<String, ParseError> {
    let depth = c.u8()?;
    let bits_per_pixel = c.u8()?;
    let scanline_pad = c.u8()?;
    c.skip(5)?;
    let mut f = FieldList::new();
    f.push("depth", depth.to_string());
    f.push("bits-per-pixel", bits_per_pixel.to_string());
    f.push("scanline-pad", scanline_pad.to_string());
    Ok(f.render(opts, 2))
}

fn parse_screen(c: &mut Cursor<'_>, opts: &FmtOptions) -> Result<String, ParseError> {
    let root = c.u32()?;
    let default_colormap = c.u32()?;
    let white_pixel = c.u32()?;
    let black_pixel = c.u32()?;
    let input_masks = c.u32()?;
    let width_px = c.u16()?;
    let height_px = c.u16()?;
    let width_mm = c.u16()?;
    let height_mm = c.u16()?;
    let min_maps = c.u16()?;
    let max_maps = c.u16()?;
    let root_visual = c.u32()?;
    let backing_stores = c.u8()?;
    let save_unders = c.u8()?;
    let root_depth = c.u8()?;
    let depths_count = c.u8()? as usize;

    let mut depths = Vec::with_capacity(depths_count);
    for _ in 0..depths_count {
        depths.push(parse_depth(c, opts)?);
    }

    let mut f = FieldList::new();
    f.push("root", root.to_string());
    f.push("default-colormap", default_colormap.to_string());
    f.push("white-pixel", fmt::fmt_hex32(white_pixel));
    f.push("black-pixel", fmt::fmt_hex32(black_pixel));
    f.push(
        "current-input-masks",
        fmt::fmt_mask(input_masks, enums::EVENT_MASK),
    );
    f.push("width-in-pixels", width_px.to_string());
    f.push("height-in-pixels", height_px.to_string());
    f.push("width-in-millimeters", width_mm.to_string());
    f.push("height-in-millimeters", height_mm.to_string());
    f.push("min-installed-maps", min_maps.to_string());
    f.push("max-installed-maps", max_maps.to_string());
    f.push("root-visual", root_visual.to_string());
    f.push(
        "backing-stores",
        fmt::fmt_enum(u32::from(backing_stores), enums::SCREEN_BACKING_STORES),
    );
    f.push("save-unders", fmt::fmt_bool(save_unders));
    f.push("root-depth", root_depth.to_string());
    f.push("allowed-depths", fmt::fmt_list(&depths, opts, 2, false));
    Ok(f.render(opts, 2))
}

fn parse_depth(c: &mut Cursor<'_>, opts: &FmtOptions) -> Result<String, ParseError> {
    let depth = c.u8()?;
    c.skip(1)?;
    let visuals_count = c.u16()? as usize;
    c.skip(4)?;
    let mut visuals = Vec::with_capacity(visuals_count);
    for _ in 0..visuals_count {
        visuals.push(parse_visualtype(c, opts)?);
    }
    let mut f = FieldList::new();
    f.push("depth", depth.to_string());
    f.push("visuals", fmt::fmt_list(&visuals, opts, 3, false));
    Ok(f.render(opts, 3))
}

fn parse_visualtype(c: &mut Cursor<'_>, opts: &FmtOptions) -> Result<String, ParseError> {
    let visual_id = c.u32()?;
    let class = c.u8()?;
    let bits_per_rgb = c.u8()?;
    let colormap_entries = c.u16()?;
    let red_mask = c.u32()?;
    let green_mask = c.u32()?;
    let blue_mask = c.u32()?;
    c.skip(4)?;
    let mut f = FieldList::new();
    f.push("visual-id", visual_id.to_string());
    f.push("class", fmt::fmt_enum(u32::from(class), enums::VISUAL_CLASS));
    f.push("bits-per-rgb-value", bits_per_rgb.to_string());
    f.push("colormap-entries", colormap_entries.to_string());
    f.push("red-mask", fmt::fmt_hex32(red_mask));
    f.push("green-mask", fmt::fmt_hex32(green_mask));
    f.push("blue-mask", fmt::fmt_hex32(blue_mask));
    Ok(f.render(opts, 4))
}

/// Minimal initiation frame (11.0, no auth) for tests.
#[cfg(test)]
pub(crate) fn test_initiation_frame(order_octet: u8) -> Vec<u8> {
    match order_octet {
        b'l' => vec![0x6c, 0, 11, 0, 0, 0, 0, 0, 0, 0, 0, 0],
        b'B' => vec![0x42, 0, 0, 11, 0, 0, 0, 0, 0, 0, 0, 0],
        _ => unreachable!(),
    }
}

/// Minimal acceptance frame for tests, written in the client's byte
/// order: empty vendor, no formats, one screen with one depth holding one
/// visual. 8 + 104 bytes.
#[cfg(test)]
pub(crate) fn test_acceptance_frame(order: ByteOrder) -> Vec<u8> {
    let u16b = |v: u16| match order {
        ByteOrder::LittleEndian => v.to_le_bytes(),
        ByteOrder::BigEndian => v.to_be_bytes(),
    };
    let u32b = |v: u32| match order {
        ByteOrder::LittleEndian => v.to_le_bytes(),
        ByteOrder::BigEndian => v.to_be_bytes(),
    };
    let mut buf = Vec::new();
    buf.extend_from_slice(&[1, 0]); // Success, unused
    buf.extend_from_slice(&u16b(11));
    buf.extend_from_slice(&u16b(0));
    buf.extend_from_slice(&u16b(26)); // (104 / 4) additional units
    buf.extend_from_slice(&u32b(0)); // release
    buf.extend_from_slice(&u32b(0)); // id base
    buf.extend_from_slice(&u32b(0)); // id mask
    buf.extend_from_slice(&u32b(0)); // motion buffer
    buf.extend_from_slice(&u16b(0)); // vendor len
    buf.extend_from_slice(&u16b(65535)); // max request len
    buf.push(1); // roots
    buf.push(0); // formats
    buf.push(0); // LSBFirst
    buf.push(0); // LeastSignificant
    buf.push(32); // scanline unit
    buf.push(32); // scanline pad
    buf.push(8); // min keycode
    buf.push(255); // max keycode
    buf.extend_from_slice(&[0; 4]);
    // SCREEN (40 bytes)
    buf.extend_from_slice(&u32b(0x25)); // root
    buf.extend_from_slice(&u32b(0x20)); // default colormap
    buf.extend_from_slice(&u32b(0x00ff_ffff)); // white
    buf.extend_from_slice(&u32b(0)); // black
    buf.extend_from_slice(&u32b(0)); // input masks
    buf.extend_from_slice(&u16b(1920));
    buf.extend_from_slice(&u16b(1080));
    buf.extend_from_slice(&u16b(508));
    buf.extend_from_slice(&u16b(285));
    buf.extend_from_slice(&u16b(1));
    buf.extend_from_slice(&u16b(1));
    buf.extend_from_slice(&u32b(0x21)); // root visual
    buf.push(2); // backing stores Always
    buf.push(0); // save unders
    buf.push(24); // root depth
    buf.push(1); // one depth
    // DEPTH (8 bytes)
    buf.push(24);
    buf.push(0);
    buf.extend_from_slice(&u16b(1));
    buf.extend_from_slice(&[0; 4]);
    // VISUALTYPE (24 bytes)
    buf.extend_from_slice(&u32b(0x21));
    buf.push(4); // TrueColor
    buf.push(8);
    buf.extend_from_slice(&u16b(256));
    buf.extend_from_slice(&u32b(0x00ff_0000));
    buf.extend_from_slice(&u32b(0x0000_ff00));
    buf.extend_from_slice(&u32b(0x0000_00ff));
    buf.extend_from_slice(&[0; 4]);
    assert_eq!(buf.len(), 112);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initiation_framing() {
        assert_eq!(framed_initiation_size(&[0x6c, 0]).unwrap(), None);
        let frame = test_initiation_frame(b'l');
        assert_eq!(framed_initiation_size(&frame).unwrap(), Some(12));
        assert!(framed_initiation_size(&[0xff; 12]).is_err());
    }

    #[test]
    fn test_lsb_initiation() {
        let frame = test_initiation_frame(b'l');
        let init = parse_initiation(&frame).unwrap();
        assert_eq!(init.byte_order, ByteOrder::LittleEndian);
        assert_eq!(init.size, 12);
        let rendered = init.fields.render(&FmtOptions::default(), 0);
        assert!(rendered.contains("byte-order=LSBFirst"));
        assert!(rendered.contains("protocol-major-version=11"));
    }

    #[test]
    fn test_msb_initiation_swaps_fields() {
        let frame = test_initiation_frame(b'B');
        let init = parse_initiation(&frame).unwrap();
        assert_eq!(init.byte_order, ByteOrder::BigEndian);
        let rendered = init.fields.render(&FmtOptions::default(), 0);
        assert!(rendered.contains("byte-order=MSBFirst"));
        assert!(rendered.contains("protocol-major-version=11"));
    }

    #[test]
    fn test_acceptance_tree() {
        let frame = test_acceptance_frame(ByteOrder::LittleEndian);
        assert_eq!(
            framed_response_size(&frame, ByteOrder::LittleEndian).unwrap(),
            Some(112)
        );
        let response =
            parse_response(&frame, ByteOrder::LittleEndian, &FmtOptions::default()).unwrap();
        assert_eq!(response.status, SetupStatus::Success);
        assert_eq!(response.title, "server accepted connection");
        let rendered = response.fields.render(&FmtOptions::default(), 0);
        assert!(rendered.contains("protocol-major-version=11"));
        assert!(rendered.contains("maximum-request-length=65535"));
        assert!(rendered.contains("pixmap-formats=[]"));
        assert!(rendered.contains("roots=[ {"));
        assert!(rendered.contains("class=TrueColor(4)"));
        assert!(rendered.contains("min-keycode=8"));
    }

    #[test]
    fn test_refusal() {
        let reason = b"Access denied";
        let mut frame = vec![0u8, reason.len() as u8];
        frame.extend_from_slice(&11u16.to_le_bytes());
        frame.extend_from_slice(&0u16.to_le_bytes());
        frame.extend_from_slice(&(align::aligned_units(reason.len()) as u16).to_le_bytes());
        frame.extend_from_slice(reason);
        frame.extend_from_slice(&[0; 3]);
        let response =
            parse_response(&frame, ByteOrder::LittleEndian, &FmtOptions::default()).unwrap();
        assert_eq!(response.status, SetupStatus::Failed);
        let rendered = response.fields.render(&FmtOptions::default(), 0);
        assert!(rendered.contains("reason=\"Access denied\""));
    }

    #[test]
    fn test_bad_status_byte() {
        let frame = [9u8, 0, 0, 0, 0, 0, 0, 0];
        assert!(framed_response_size(&frame, ByteOrder::LittleEndian).is_err());
    }
}
