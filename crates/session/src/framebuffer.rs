/// Core-owned pixel buffer sized to the current window.
///
/// Written only by the download step of `present`, read only by the blit
/// step. Resizing to a new size reallocates and throws away prior contents;
/// resizing to the current size is a no-op.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u32] {
        &mut self.pixels
    }

    /// Resize to `width` × `height`, reallocating on any size change.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == self.width && height == self.height {
            return;
        }
        self.width = width;
        self.height = height;
        self.pixels = vec![0; width as usize * height as usize];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_matches_dimensions() {
        let fb = FrameBuffer::new(800, 600);
        assert_eq!(fb.pixels().len(), 800 * 600);
    }

    #[test]
    fn zero_sized_buffer_is_fine() {
        let fb = FrameBuffer::new(0, 0);
        assert_eq!(fb.pixels().len(), 0);
        let fb = FrameBuffer::new(640, 0);
        assert_eq!(fb.pixels().len(), 0);
    }

    #[test]
    fn resize_reallocates() {
        let mut fb = FrameBuffer::new(800, 600);
        fb.pixels_mut()[0] = 0xdead_beef;
        fb.resize(1920, 1080);
        assert_eq!(fb.pixels().len(), 1920 * 1080);
        assert_eq!(fb.width(), 1920);
        assert_eq!(fb.height(), 1080);
    }

    #[test]
    fn resize_to_same_size_keeps_contents() {
        let mut fb = FrameBuffer::new(16, 16);
        fb.pixels_mut()[5] = 42;
        fb.resize(16, 16);
        assert_eq!(fb.pixels()[5], 42);
    }

    #[test]
    fn resize_to_zero_and_back() {
        let mut fb = FrameBuffer::new(8, 8);
        fb.resize(0, 0);
        assert_eq!(fb.pixels().len(), 0);
        fb.resize(4, 2);
        assert_eq!(fb.pixels().len(), 8);
    }
}
