//! Prompt construction for the summary and generation endpoints.

use serde_json::{Map, Value};

/// Serialized payloads longer than this many lines get truncated.
pub const TRUNCATION_TRIGGER_LINES: usize = 70;

/// Lines kept from a truncated payload.
pub const TRUNCATED_LINES: usize = 50;

/// Line cap the model is asked to respect when generating samples.
pub const GENERATION_MAX_LINES: usize = 50;

/// Sentence the model must answer with when the payload is not a coherent dataset.
pub const FALLBACK_SENTENCE: &str = "Não foi possível analisar os dados recebidos, pois não são compatíveis com um conjunto analítico estruturado.";

/// A summary prompt plus whether the payload had to be cut.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryPrompt {
    pub text: String,
    pub truncated: bool,
}

/// Keep the first [`TRUNCATED_LINES`] lines of `text` once it exceeds
/// [`TRUNCATION_TRIGGER_LINES`]. Line based only; JSON may be cut mid-structure.
pub fn truncate_lines(text: &str) -> (String, bool) {
    if text.lines().count() > TRUNCATION_TRIGGER_LINES {
        let kept: Vec<&str> = text.lines().take(TRUNCATED_LINES).collect();
        (kept.join("\n"), true)
    } else {
        (text.to_string(), false)
    }
}

/// Build the summary prompt for a validated payload.
pub fn summary_prompt(payload: &Map<String, Value>) -> Result<SummaryPrompt, serde_json::Error> {
    let rendered = serde_json::to_string_pretty(payload)?;
    let (json_str, truncated) = truncate_lines(&rendered);

    if truncated {
        tracing::info!(payload = %json_str, "Sending truncated payload to prompt");
    }

    let text = format!(
        "Você recebeu os seguintes dados de um webhook:

{json_str}

Sua tarefa é gerar um resumo objetivo explicando o que está presente nos dados recebidos. Identifique padrões, informações importantes ou alertas que possam ser úteis para o gestor.

⚠️ MUITO IMPORTANTE:

Se os dados recebidos não forem um conjunto estruturado ou não representarem um compilado coerente de informações (ex: apenas uma frase solta, insultos, frases desconexas, ou algo fora de contexto), **responda apenas com a frase**:

\"{FALLBACK_SENTENCE}\"

Não tente interpretar insultos, frases únicas ou dados aleatórios. Apenas valide se os dados parecem **coerentes e estruturados**.
"
    );

    Ok(SummaryPrompt { text, truncated })
}

/// Fixed prompt asking for a creative JSON array. Takes no user input.
pub fn generation_prompt() -> String {
    format!(
        "Gere um array de dados no formato JSON puro, sem usar aspas triplas, markdown ou ```json.

A estrutura deve ser um array de objetos com o mesmo formato.

Limite o conteúdo a no máximo {GENERATION_MAX_LINES} linhas totais.

Use criatividade no conteúdo, mas mantenha uma estrutura consistente. Exemplo de temas: avaliações de alienígenas em pizzarias, fichas técnicas de dragões, dados de eventos em galáxias distantes, mas não use esses exemplos, seja criativo.
"
    )
}
