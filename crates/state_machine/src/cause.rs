#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SweepCause {
    /// матрица конфигураций собрана, строки запускаются
    Started,
    /// все строки отработали (упавшие просто выброшены)
    RowsFinished,
    /// повторный запуск того же компаратора
    Reset,
}
