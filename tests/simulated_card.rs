use desfire_keysearch::nfc::{DesfireKey, Framing, MiFareDESFireCard, MiFareDESFireSimulation};
use desfire_keysearch::{
    search, ApplicationId, AuthScheme, CandidateSource, KeyNumber, SearchError, SearchOutcome,
    SearchTarget,
};

const AID: [u8; 3] = [0x34, 0x12, 0x00];

fn material() -> CandidateSource {
    CandidateSource::from((0u8..48).collect::<Vec<u8>>())
}

fn target(key_no: u8) -> SearchTarget {
    SearchTarget::new(ApplicationId::new(0x1234), KeyNumber::try_from(key_no).unwrap())
}

fn card(keys: Vec<DesfireKey>, framing: Framing) -> MiFareDESFireCard<MiFareDESFireSimulation> {
    MiFareDESFireCard::new(
        MiFareDESFireSimulation::new()
            .with_framing(framing)
            .with_application(AID, keys),
        framing,
    )
}

#[test]
fn finds_a_des_key() {
    let source = material();
    let key = DesfireKey::des(&source.as_bytes()[8..16]);
    let mut card = card(vec![key], Framing::Native);

    let outcome = search(&source, target(0), AuthScheme::Des, &mut card).unwrap();

    assert_eq!(
        outcome,
        SearchOutcome::Found {
            offset: 8,
            key: source.as_bytes()[8..16].to_vec(),
            attempts: 9,
        }
    );
    assert_eq!(card.card.selects, 9);
    assert_eq!(card.card.authenticated, Some(0));
}

#[test]
fn finds_a_2k3des_key_in_a_later_slot() {
    let source = material();
    let keys = vec![
        DesfireKey::triple_des(&[0xEE; 16]),
        DesfireKey::triple_des(&source.as_bytes()[3..19]),
    ];
    let mut card = card(keys, Framing::Native);

    let outcome = search(&source, target(1), AuthScheme::TripleDes, &mut card).unwrap();

    assert!(matches!(outcome, SearchOutcome::Found { offset: 3, .. }));
    assert_eq!(card.card.authenticated, Some(1));
}

#[test]
fn finds_a_3k3des_key_over_wrapped_framing() {
    let source = material();
    let key = DesfireKey::three_k3des(&source.as_bytes()[20..44]);
    let mut card = card(vec![key], Framing::Wrapped);

    let outcome = search(&source, target(0), AuthScheme::ThreeK3Des, &mut card).unwrap();

    assert!(matches!(
        outcome,
        SearchOutcome::Found {
            offset: 20,
            attempts: 21,
            ..
        }
    ));
}

#[test]
fn finds_an_aes_key_in_the_final_window() {
    let source = material();
    let key = DesfireKey::aes(&source.as_bytes()[32..48]);
    let mut card = card(vec![key], Framing::Native);

    let outcome = search(&source, target(0), AuthScheme::Aes, &mut card).unwrap();

    assert!(matches!(
        outcome,
        SearchOutcome::Found {
            offset: 32,
            attempts: 33,
            ..
        }
    ));
}

#[test]
fn wrong_scheme_exhausts_the_material() {
    let source = material();
    let key = DesfireKey::aes(&source.as_bytes()[0..16]);
    let mut card = card(vec![key], Framing::Native);

    let outcome = search(&source, target(0), AuthScheme::Des, &mut card).unwrap();

    assert_eq!(outcome, SearchOutcome::Exhausted { attempts: 41 });
    assert_eq!(card.card.authenticated, None);
}

#[test]
fn missing_key_slot_aborts_the_search() {
    let source = material();
    let mut card = card(vec![DesfireKey::des(&[0; 8])], Framing::Native);

    let result = search(&source, target(5), AuthScheme::Des, &mut card);

    assert!(matches!(result, Err(SearchError::SessionFault("authenticate", _))));
    assert_eq!(card.card.authentications, 1);
}

#[test]
fn card_removal_aborts_the_search() {
    let source = material();
    let mut card = MiFareDESFireCard::new(
        MiFareDESFireSimulation::new()
            .with_application(AID, vec![DesfireKey::des(&[0xAA; 8])])
            .remove_after_selects(3),
        Framing::Native,
    );

    let result = search(&source, target(0), AuthScheme::Des, &mut card);

    assert!(matches!(result, Err(SearchError::SessionFault(_, _))));
    assert!(result.unwrap_err().exit_code() == 3);
}
