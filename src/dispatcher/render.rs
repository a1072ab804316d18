//! User-facing texts and keyboards

use super::Button;
use crate::db::WordPair;
use crate::quiz::{DeleteOutcome, QuizError, Question};
use crate::runtime::OutgoingMessage;

fn control_buttons() -> Vec<String> {
    [Button::Next, Button::AddWord, Button::DeleteWord]
        .iter()
        .map(|b| b.label().to_string())
        .collect()
}

pub fn greeting(display_name: &str) -> OutgoingMessage {
    OutgoingMessage::text(format!(
        "👋 Привет, {display_name}! Добро пожаловать в EnglishQuest! 🌟\n\n\
         Я ваш персональный бот для изучения английских слов. 📚\n\
         С помощью меня вы сможете:\n\
         ✅ Изучать новые слова\n\
         ✅ Проверять свои знания\n\
         ✅ Добавлять свои слова\n\n\
         Чтобы начать, нажмите /learn или /help, чтобы получить список доступных команд. 🚀"
    ))
}

pub fn welcome_back(display_name: &str) -> OutgoingMessage {
    OutgoingMessage::text(format!(
        "{display_name}!\n\
         Чтобы продолжить, воспользуйтесь кнопками на клавиатуре. 📲\n\
         Если вам нужна помощь, нажмите /help, чтобы увидеть все команды. 🚀"
    ))
}

pub fn help() -> OutgoingMessage {
    OutgoingMessage::text(
        "🔍 Доступные команды:\n\n\
         /learn - начать изучение слов 📚\n\
         /list - список изучаемых слов 📜\n\
         /help - эта подсказка\n\n\
         Во время тренировки используйте кнопки:\n\
         «Дальше» - следующее слово, «Добавить слово» - добавить своё слово, \
         «Удалить слово» - убрать текущее слово из своего списка.",
    )
}

pub fn word_list(words: &[WordPair]) -> OutgoingMessage {
    if words.is_empty() {
        return OutgoingMessage::text(
            "У вас нет изучаемых слов. Добавьте слова кнопкой «Добавить слово» во время /learn.",
        );
    }
    let lines: Vec<String> = words.iter().map(ToString::to_string).collect();
    OutgoingMessage::text(format!("📜 Ваши изучаемые слова:\n{}", lines.join("\n")))
}

/// Question with the shuffled options followed by the control buttons
pub fn question(question: &Question) -> OutgoingMessage {
    let mut buttons = question.options.clone();
    buttons.extend(control_buttons());
    OutgoingMessage::text(format!(
        "🗣️ Выберите перевод слова: 🇷🇺 {}\n\nВот ваши варианты:",
        question.source_text
    ))
    .with_buttons(buttons)
}

pub fn correct(pair: &WordPair) -> OutgoingMessage {
    OutgoingMessage::text(format!("✅ Правильно! Отличная работа!\n{pair}"))
        .with_buttons(control_buttons())
}

pub fn incorrect() -> OutgoingMessage {
    OutgoingMessage::text("❌ Неправильно. Попробуйте еще раз!")
}

pub fn ask_source() -> OutgoingMessage {
    OutgoingMessage::text("✏️ Введите слово на русском 🇷🇺:")
}

pub fn ask_target(source_text: &str) -> OutgoingMessage {
    OutgoingMessage::text(format!("Введите перевод слова «{source_text}» на английский 🇺🇸:"))
}

pub fn word_added(pair: &WordPair) -> OutgoingMessage {
    OutgoingMessage::text(format!("✅ Слово успешно добавлено!\n{pair}"))
}

pub fn deleted(outcome: &DeleteOutcome) -> OutgoingMessage {
    match outcome {
        DeleteOutcome::Deleted(pair) => {
            OutgoingMessage::text(format!("✅ Слово успешно удалено!\n{pair}"))
        }
        DeleteOutcome::NotOwned(pair) => OutgoingMessage::text(format!(
            "ℹ️ Слово «{}» входит в общий словарь, удалить можно только добавленные вами слова.",
            pair.source_text
        )),
    }
}

pub fn idle_hint() -> OutgoingMessage {
    OutgoingMessage::text("Нажмите /learn, чтобы начать тренировку, или /help для списка команд.")
}

pub fn unknown_command(command: &str) -> OutgoingMessage {
    OutgoingMessage::text(format!("Неизвестная команда {command}. Нажмите /help."))
}

pub fn error(err: &QuizError) -> OutgoingMessage {
    match err {
        QuizError::InsufficientVocabulary { available, required } => {
            OutgoingMessage::text(format!(
                "❌ Недостаточно слов для обучения ({available} из {required}). \
                 Пожалуйста, добавьте больше слов."
            ))
            .with_buttons(vec![Button::AddWord.label().to_string()])
        }
        QuizError::NoActiveQuestion => {
            OutgoingMessage::text("Сейчас нет активного вопроса. Нажмите /learn, чтобы начать.")
        }
        QuizError::NotInAddFlow => OutgoingMessage::text(
            "Чтобы добавить слово, нажмите кнопку «Добавить слово».",
        ),
        QuizError::EmptyText => {
            OutgoingMessage::text("Слово не может быть пустым. Попробуйте еще раз:")
        }
        QuizError::DuplicateWord(pair) => OutgoingMessage::text(format!(
            "Слово «{}» уже есть в вашем списке.",
            pair.source_text
        ))
        .with_buttons(control_buttons()),
        QuizError::Storage(_) | QuizError::UserNotFound(_) => {
            OutgoingMessage::text("❌ Произошла ошибка. Попробуйте еще раз чуть позже.")
        }
    }
}
