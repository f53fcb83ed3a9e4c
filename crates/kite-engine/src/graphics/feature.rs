use super::names::named_enum;

named_enum! {
    /// Optional capability that scripts can query before relying on it.
    pub enum Feature ("graphics feature") {
        Canvas => "canvas",
        Npot => "npot",
        MultiCanvas => "multicanvas",
        HdrCanvas => "hdrcanvas",
        Msaa => "msaa",
    }
}
