pub trait Drawable {
    fn clear_all_pixels(&mut self);
    /// XOR `bit` into the pixel at (x, y), wrapping around the edges.
    /// Returns true if a set pixel was hit by a set bit.
    fn xor_pixel(&mut self, x: usize, y: usize, bit: bool) -> bool;

    fn get_pixel(&self, x: usize, y: usize) -> bool;

    fn in_bounds(&self, x: usize, y: usize) -> bool;
}
