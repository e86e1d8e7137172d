use crate::models::Category;

pub fn build_classification_prompt(cleaned: &str) -> String {
    format!(
        r#"Analise o seguinte email e classifique-o como "produtivo" ou "improdutivo":

Email: "{cleaned}"

Critérios:
- PRODUTIVO: Relacionado a trabalho, negócios, projetos, reuniões, contratos, propostas, relatórios, decisões importantes
- IMPRODUTIVO: Spam, correntes, piadas, fofocas, assuntos pessoais irrelevantes, propaganda não solicitada

Responda APENAS em formato JSON, sem nada antes ou depois das chaves:
{{
    "category": "produtivo" ou "improdutivo",
    "confidence": 0.0 a 1.0,
    "reasoning": "breve explicação da classificação",
    "keywords": ["palavras-chave", "identificadas"]
}}"#
    )
}

pub fn build_reply_prompt(cleaned: &str, category: Category) -> String {
    match category {
        Category::Productive => format!(
            r#"Gere uma resposta profissional e cordial para este email produtivo:
"{cleaned}"

A resposta deve:
- Ser profissional e educada
- Confirmar o recebimento
- Indicar que será analisado/processado
- Ter no máximo 2-3 frases
- Estar em português"#
        ),
        Category::Unproductive => format!(
            r#"Gere uma resposta educada mas breve para este email improdutivo:
"{cleaned}"

A resposta deve:
- Ser educada mas direta
- Indicar foco em questões profissionais
- Ter no máximo 1-2 frases
- Estar em português"#
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_prompt_embeds_email_and_json_contract() {
        let prompt = build_classification_prompt("revisar contrato amanhã");
        assert!(prompt.contains("Email: \"revisar contrato amanhã\""));
        assert!(prompt.contains("\"produtivo\" ou \"improdutivo\""));
        for field in ["\"category\"", "\"confidence\"", "\"reasoning\"", "\"keywords\""] {
            assert!(prompt.contains(field), "missing {field}");
        }
        assert!(prompt.contains("Responda APENAS em formato JSON"));
    }

    #[test]
    fn reply_prompt_depends_on_category() {
        let productive = build_reply_prompt("relatório anexo", Category::Productive);
        assert!(productive.contains("email produtivo"));
        assert!(productive.contains("Confirmar o recebimento"));
        assert!(productive.contains("2-3 frases"));

        let unproductive = build_reply_prompt("corrente da sorte", Category::Unproductive);
        assert!(unproductive.contains("email improdutivo"));
        assert!(unproductive.contains("1-2 frases"));
        assert!(unproductive.contains("\"corrente da sorte\""));

        for prompt in [productive, unproductive] {
            assert!(prompt.contains("Estar em português"));
        }
    }
}
