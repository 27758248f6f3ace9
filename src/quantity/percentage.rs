quantity!(Percentage, suffix: "%", precision: 1);

impl Percentage {
    /// Convert the percentage into a ratio, `100%` being `1.0`.
    pub fn to_ratio(self) -> f64 {
        self.0 / 100.0
    }
}
