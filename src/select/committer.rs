/// Maps a picked item to the parent's selection shape and hands it over.
/// `S::default()` is the "nothing selected" sentinel sent on clear.
pub struct SelectionCommitter<T, S> {
    map: Box<dyn Fn(&T) -> S + Send>,
    on_select: Box<dyn FnMut(S) + Send>,
}

impl<T, S: Default> SelectionCommitter<T, S> {
    pub fn new<M, C>(map: M, on_select: C) -> Self
    where
        M: Fn(&T) -> S + Send + 'static,
        C: FnMut(S) + Send + 'static,
    {
        Self {
            map: Box::new(map),
            on_select: Box::new(on_select),
        }
    }

    /// Invokes the parent callback synchronously with the mapped item.
    pub fn select(&mut self, item: &T) {
        let selection = (self.map)(item);
        (self.on_select)(selection);
    }

    pub fn clear(&mut self) {
        (self.on_select)(S::default());
    }
}
