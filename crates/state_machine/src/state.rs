/// Жизненный цикл свипа. Промежуточных состояний нет.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SweepState {
    Idle,
    Running,
    Done,
}
