// ---------------------------------------------------------------------------
// Machines à états des deux parties
//
// La séquence est strictement requête/réponse :
//   Serveur : IDLE -> RECEIVED_OPRF_QUERY -> SENT_OPRF_REPLY
//             -> RECEIVED_FHE_QUERY -> SENT_REPLY -> DONE
//   Client  : IDLE -> SENT_OPRF_QUERY -> RECEIVED_OPRF_REPLY
//             -> SENT_FHE_QUERY -> RECEIVED_REPLY -> DONE
//
// Chaque étape du driver déclare sa transition ; tout message hors séquence
// est fatal.
// ---------------------------------------------------------------------------

use crate::psi_error::psi_error::PsiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Idle,
    ReceivedOprfQuery,
    SentOprfReply,
    ReceivedFheQuery,
    SentReply,
    Done,
}

impl ServerState {
    fn label(self) -> &'static str {
        match self {
            ServerState::Idle => "IDLE",
            ServerState::ReceivedOprfQuery => "RECEIVED_OPRF_QUERY",
            ServerState::SentOprfReply => "SENT_OPRF_REPLY",
            ServerState::ReceivedFheQuery => "RECEIVED_FHE_QUERY",
            ServerState::SentReply => "SENT_REPLY",
            ServerState::Done => "DONE",
        }
    }
}

#[derive(Debug)]
pub struct ServerStateMachine {
    state: ServerState,
}

impl Default for ServerStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerStateMachine {
    pub fn new() -> Self {
        ServerStateMachine { state: ServerState::Idle }
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    pub fn transition(&mut self, to: ServerState) -> Result<(), PsiError> {
        use ServerState::*;
        let legal = matches!(
            (self.state, to),
            (Idle, ReceivedOprfQuery)
                | (ReceivedOprfQuery, SentOprfReply)
                | (SentOprfReply, ReceivedFheQuery)
                | (ReceivedFheQuery, SentReply)
                | (SentReply, Done)
        );
        if !legal {
            return Err(PsiError::ProtocolStateMismatch {
                expected: to.label(),
                state:    self.state.label(),
            });
        }
        self.state = to;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Idle,
    SentOprfQuery,
    ReceivedOprfReply,
    SentFheQuery,
    ReceivedReply,
    Done,
}

impl ClientState {
    fn label(self) -> &'static str {
        match self {
            ClientState::Idle => "IDLE",
            ClientState::SentOprfQuery => "SENT_OPRF_QUERY",
            ClientState::ReceivedOprfReply => "RECEIVED_OPRF_REPLY",
            ClientState::SentFheQuery => "SENT_FHE_QUERY",
            ClientState::ReceivedReply => "RECEIVED_REPLY",
            ClientState::Done => "DONE",
        }
    }
}

#[derive(Debug)]
pub struct ClientStateMachine {
    state: ClientState,
}

impl Default for ClientStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientStateMachine {
    pub fn new() -> Self {
        ClientStateMachine { state: ClientState::Idle }
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    pub fn transition(&mut self, to: ClientState) -> Result<(), PsiError> {
        use ClientState::*;
        let legal = matches!(
            (self.state, to),
            (Idle, SentOprfQuery)
                | (SentOprfQuery, ReceivedOprfReply)
                | (ReceivedOprfReply, SentFheQuery)
                | (SentFheQuery, ReceivedReply)
                | (ReceivedReply, Done)
        );
        if !legal {
            return Err(PsiError::ProtocolStateMismatch {
                expected: to.label(),
                state:    self.state.label(),
            });
        }
        self.state = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_serveur_complete() {
        let mut sm = ServerStateMachine::new();
        sm.transition(ServerState::ReceivedOprfQuery).unwrap();
        sm.transition(ServerState::SentOprfReply).unwrap();
        sm.transition(ServerState::ReceivedFheQuery).unwrap();
        sm.transition(ServerState::SentReply).unwrap();
        sm.transition(ServerState::Done).unwrap();
        assert_eq!(sm.state(), ServerState::Done);
    }

    #[test]
    fn test_message_hors_sequence_fatal() {
        let mut sm = ServerStateMachine::new();
        assert!(matches!(
            sm.transition(ServerState::ReceivedFheQuery),
            Err(PsiError::ProtocolStateMismatch { .. })
        ));
    }

    #[test]
    fn test_client_ne_saute_pas_d_etape() {
        let mut sm = ClientStateMachine::new();
        sm.transition(ClientState::SentOprfQuery).unwrap();
        assert!(sm.transition(ClientState::SentFheQuery).is_err());
    }
}
