use pdf_writer::{Filter, Pdf, Ref};

/// An image written once as an XObject and referenced by name from any page.
#[derive(Clone, Debug)]
pub(crate) struct EmbeddedImage {
    pub(crate) name: String,
    pub(crate) xobject: Ref,
    pub(crate) pixel_width: u32,
    pub(crate) pixel_height: u32,
}

impl EmbeddedImage {
    pub(crate) fn aspect(&self) -> f32 {
        if self.pixel_width == 0 {
            1.0
        } else {
            self.pixel_height as f32 / self.pixel_width as f32
        }
    }
}

/// Embed encoded image bytes. JPEG data is passed through with DCTDecode;
/// everything else is decoded and re-encoded as Flate RGB with an alpha SMask
/// when any pixel is translucent.
pub(crate) fn embed_image(
    pdf: &mut Pdf,
    alloc: &mut impl FnMut() -> Ref,
    name: String,
    data: &[u8],
) -> Result<EmbeddedImage, image::ImageError> {
    let format = image::guess_format(data)?;
    let xobject = alloc();

    if format == image::ImageFormat::Jpeg {
        let reader = image::ImageReader::with_format(std::io::Cursor::new(data), format);
        let (w, h) = reader.into_dimensions()?;
        let mut xobj = pdf.image_xobject(xobject, data);
        xobj.filter(Filter::DctDecode);
        xobj.width(w as i32);
        xobj.height(h as i32);
        xobj.color_space().device_rgb();
        xobj.bits_per_component(8);
        return Ok(EmbeddedImage {
            name,
            xobject,
            pixel_width: w,
            pixel_height: h,
        });
    }

    let rgba = image::load_from_memory_with_format(data, format)?.to_rgba8();
    let (w, h) = (rgba.width(), rgba.height());
    let has_alpha = rgba.pixels().any(|p| p.0[3] < 255);

    let rgb_data: Vec<u8> = rgba
        .pixels()
        .flat_map(|p| [p.0[0], p.0[1], p.0[2]])
        .collect();
    let compressed_rgb = miniz_oxide::deflate::compress_to_vec_zlib(&rgb_data, 6);

    let smask = if has_alpha {
        let alpha: Vec<u8> = rgba.pixels().map(|p| p.0[3]).collect();
        let compressed_alpha = miniz_oxide::deflate::compress_to_vec_zlib(&alpha, 6);
        let mask_ref = alloc();
        let mut mask = pdf.image_xobject(mask_ref, &compressed_alpha);
        mask.filter(Filter::FlateDecode);
        mask.width(w as i32);
        mask.height(h as i32);
        mask.color_space().device_gray();
        mask.bits_per_component(8);
        Some(mask_ref)
    } else {
        None
    };

    let mut xobj = pdf.image_xobject(xobject, &compressed_rgb);
    xobj.filter(Filter::FlateDecode);
    xobj.width(w as i32);
    xobj.height(h as i32);
    xobj.color_space().device_rgb();
    xobj.bits_per_component(8);
    if let Some(mask_ref) = smask {
        xobj.s_mask(mask_ref);
    }

    Ok(EmbeddedImage {
        name,
        xobject,
        pixel_width: w,
        pixel_height: h,
    })
}
