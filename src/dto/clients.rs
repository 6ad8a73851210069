use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

/// Body of `POST /clientes` and `PUT /clientes/:id`
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct ClienteRequest {
    #[serde(default)]
    #[validate(custom = "validate_not_blank")]
    pub nome: String,
    #[serde(default)]
    pub telefone: Option<String>,
    #[serde(default)]
    #[validate(email(message = "Email inválido"))]
    pub email: Option<String>,
    #[serde(default)]
    pub endereco: Option<String>,
    #[serde(default)]
    pub cidade: Option<String>,
}

impl ClienteRequest {
    /// Trims every field and drops blank optional ones.
    pub fn normalized(self) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        Self {
            nome: self.nome.trim().to_string(),
            telefone: clean(self.telefone),
            email: clean(self.email),
            endereco: clean(self.endereco),
            cidade: clean(self.cidade),
        }
    }
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("Nome é obrigatório".into());
        return Err(err);
    }
    Ok(())
}

/// Query of `GET /clientes`
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ClienteListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    /// Case-insensitive term matched against name, phone and email
    pub q: Option<String>,
}

/// Query of `GET /clientes/search`
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ClienteSearchQuery {
    pub q: Option<String>,
}
