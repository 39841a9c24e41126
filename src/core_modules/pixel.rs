// THEORY:
// The `Pixel` module is the most fundamental unit of the vision system. It is
// a "dumb" data container for a single RGB sample plus the one heuristic the
// detection pipeline actually consumes: luminance. Anything that needs
// neighbors in space or time lives in higher-level modules.

pub mod pixel {
    pub type Byte = u8;
    pub type Channel = Byte;
    pub type Luminance = f64;

    const CHANNELS: usize = 3;

    /// A "dumb" data container representing a single RGB pixel.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Pixel {
        /// The red channel value (0-255).
        pub red: Channel,
        /// The green channel value (0-255).
        pub green: Channel,
        /// The blue channel value (0-255).
        pub blue: Channel,
    }

    impl Pixel {
        pub fn new(red: Channel, green: Channel, blue: Channel) -> Self {
            Self { red, green, blue }
        }

        /// Luminance estimate (Rec. 601 luma).
        ///
        /// - Interprets perceived brightness as a weighted sum of RGB.
        /// - This is the single channel the background model learns on.
        pub fn luminance(&self) -> Luminance {
            0.299_f64 * self.red as f64
                + 0.587_f64 * self.green as f64
                + 0.114_f64 * self.blue as f64
        }
    }

    impl From<&[Byte]> for Pixel {
        fn from(bytes: &[Byte]) -> Self {
            if bytes.len() != CHANNELS {
                panic!("Cannot convert {} bytes into pixel.", bytes.len());
            }
            Pixel::new(bytes[0], bytes[1], bytes[2])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::pixel::*;

    #[test]
    fn luminance_weights_sum_to_full_scale() {
        assert_eq!(Pixel::new(0, 0, 0).luminance(), 0.0);
        let white = Pixel::new(255, 255, 255).luminance();
        assert!((white - 255.0).abs() < 1e-9);
    }

    #[test]
    fn green_dominates_luminance() {
        let green = Pixel::new(0, 255, 0).luminance();
        let red = Pixel::new(255, 0, 0).luminance();
        let blue = Pixel::new(0, 0, 255).luminance();
        assert!(green > red && red > blue);
    }
}
