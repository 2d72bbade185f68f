use serde::{ Serialize, Deserialize };

use super::chat::ConversationTurn;
use super::recipe::Recipe;

#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "chat")] Chat {
        content: String,
    },
    #[serde(rename = "ideas")] Ideas {
        ingredients: String,
        category: String,
    },
    #[serde(rename = "surprise")]
    Surprise,
    #[serde(rename = "history")]
    History,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "response")] Response {
        content: String,
        timestamp: i64,
    },
    #[serde(rename = "recipes")] Recipes {
        category: String,
        message: String,
        recipes: Vec<Recipe>,
    },
    #[serde(rename = "recipe")] Recipe {
        message: String,
        recipe: Recipe,
    },
    #[serde(rename = "empty")] Empty {
        message: String,
    },
    #[serde(rename = "history")] History {
        turns: Vec<ConversationTurn>,
    },
    #[serde(rename = "error")] Error {
        message: String,
    },
    #[serde(rename = "processing")]
    Processing,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_messages_are_tagged_by_type() {
        let ideas: ClientMessage = serde_json
            ::from_str(r#"{"type":"ideas","ingredients":"chicken, rice","category":"Dinner"}"#)
            .unwrap();
        match ideas {
            ClientMessage::Ideas { ingredients, category } => {
                assert_eq!(ingredients, "chicken, rice");
                assert_eq!(category, "Dinner");
            }
            other => panic!("unexpected message: {:?}", other),
        }

        let surprise: ClientMessage = serde_json::from_str(r#"{"type":"surprise"}"#).unwrap();
        assert!(matches!(surprise, ClientMessage::Surprise));
    }

    #[test]
    fn server_processing_serializes_as_bare_tag() {
        let json = serde_json::to_string(&ServerMessage::Processing).unwrap();
        assert_eq!(json, r#"{"type":"processing"}"#);
    }
}
