pub mod categoria;
pub mod categoria_financeira;
pub mod cliente;
pub mod ordem;
pub mod ordem_foto;
pub mod ordem_historico;
pub mod ordem_peca;
pub mod ordem_servico;

pub use ordem::{OrderPriority, OrderStatus};
