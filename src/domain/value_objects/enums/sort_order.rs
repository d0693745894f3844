#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}
