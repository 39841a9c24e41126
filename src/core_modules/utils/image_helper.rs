pub mod image_helper {
    use image::ImageEncoder;

    /// Saves a packed RGB8 buffer as a PNG.
    pub fn save_rgb(
        name: &str,
        width: u32,
        height: u32,
        buffer: &[u8],
    ) -> Result<(), image::error::ImageError> {
        let output = std::fs::File::create(name)?;
        let encoder = image::codecs::png::PngEncoder::new(output);

        encoder.write_image(buffer, width, height, image::ExtendedColorType::Rgb8)?;

        Ok(())
    }

    /// Saves a single-channel mask as a grayscale PNG.
    pub fn save_mask(
        name: &str,
        width: u32,
        height: u32,
        buffer: &[u8],
    ) -> Result<(), image::error::ImageError> {
        let output = std::fs::File::create(name)?;
        let encoder = image::codecs::png::PngEncoder::new(output);

        encoder.write_image(buffer, width, height, image::ExtendedColorType::L8)?;

        Ok(())
    }
}
